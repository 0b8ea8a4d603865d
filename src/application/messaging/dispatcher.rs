//! Message dispatcher - Routes messages to the action they match
//!
//! Each message is scanned against every registered action, the winner is
//! authorized, and only then is its handler run. A message that matches
//! nothing, reaches a command without being direct, or fails authorization
//! is dropped without anything being sent back.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::channels::ChannelRegistry;
use super::pattern::unquote;
use crate::application::errors::BotError;
use crate::application::services::{ActionRegistry, Directory, ModuleEntry, PermissionResolver};
use crate::domain::entities::{Action, ActionKind, Invocation, Message};

/// Why a message did not reach a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NoMatch,
    /// A command matched but the message was not addressed to the bot
    NotDirect,
    Unauthorized,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NoMatch => write!(f, "no match"),
            DropReason::NotDirect => write!(f, "command not addressed to bot"),
            DropReason::Unauthorized => write!(f, "unauthorized"),
        }
    }
}

/// Outcome of dispatching one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Executed { permission: String },
    Failed { permission: String, error: String },
    Dropped(DropReason),
}

impl Dispatch {
    pub fn is_executed(&self) -> bool {
        matches!(self, Dispatch::Executed { .. })
    }
}

/// The action chosen for a message and its raw captures
#[derive(Debug, Clone)]
pub struct Selection {
    pub action: Arc<Action>,
    pub captures: Vec<Option<String>>,
}

/// Pick the action for `body`.
///
/// The first matching command wins and ends the scan. Without a command,
/// the first matching trigger is used; later triggers never replace it.
pub fn select_action(modules: &[ModuleEntry], body: &str) -> Option<Selection> {
    let mut trigger: Option<Selection> = None;

    for entry in modules {
        for action in &entry.actions {
            if action.kind == ActionKind::Trigger && trigger.is_some() {
                continue;
            }
            let Some(captures) = action.pattern.captures(body) else {
                continue;
            };

            let selection = Selection {
                action: action.clone(),
                captures,
            };
            match action.kind {
                ActionKind::Command => return Some(selection),
                ActionKind::Trigger => trigger = Some(selection),
            }
        }
    }

    trigger
}

/// Message dispatcher
pub struct Dispatcher {
    registry: Arc<ActionRegistry>,
    resolver: PermissionResolver,
    channels: Arc<ChannelRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ActionRegistry>, directory: Arc<Directory>, channels: Arc<ChannelRegistry>) -> Self {
        Self {
            registry,
            resolver: PermissionResolver::new(directory),
            channels,
        }
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    pub fn directory(&self) -> &Arc<Directory> {
        self.resolver.directory()
    }

    pub fn channels(&self) -> &Arc<ChannelRegistry> {
        &self.channels
    }

    /// Select and authorize the action for a message without running it
    pub fn resolve(&self, message: &Message) -> Result<Result<Selection, DropReason>, BotError> {
        let Some(selection) = self.registry.scan(|modules| select_action(modules, &message.body))? else {
            return Ok(Err(DropReason::NoMatch));
        };

        let action = &selection.action;
        if action.kind == ActionKind::Command && !message.direct {
            return Ok(Err(DropReason::NotDirect));
        }

        let permission = action.permission();
        tracing::debug!("[{}] {} matched {}", message.channel, message.user, permission);

        if !self.resolver.authorize(&message.user, &permission, action.secure) {
            return Ok(Err(DropReason::Unauthorized));
        }

        Ok(Ok(selection))
    }

    /// Resolve a message and run the selected handler to completion
    pub async fn dispatch(&self, message: Message) -> Result<Dispatch, BotError> {
        let selection = match self.resolve(&message)? {
            Ok(selection) => selection,
            Err(reason) => {
                tracing::debug!("[{}] Dropped message from {}: {}", message.channel, message.user, reason);
                return Ok(Dispatch::Dropped(reason));
            }
        };

        let action = selection.action;
        let permission = action.permission();
        let args = selection
            .captures
            .into_iter()
            .map(|capture| capture.map(|value| unquote(&value).to_string()))
            .collect();

        let channel = self.channels.get(&message.channel);
        let invocation = Invocation::new(message, args, action.module.as_str(), action.name.as_str())
            .with_channel(channel);

        tracing::debug!("Executing {}", permission);
        match action.handler.handle(invocation).await {
            Ok(()) => Ok(Dispatch::Executed { permission }),
            Err(e) => {
                tracing::warn!("Action {} failed: {}", permission, e);
                Ok(Dispatch::Failed {
                    permission,
                    error: e.to_string(),
                })
            }
        }
    }

    /// Dispatch on a separate task so a slow handler never holds up the caller
    pub fn spawn(self: &Arc<Self>, message: Message) -> JoinHandle<Result<Dispatch, BotError>> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(message).await })
    }

    pub async fn say(&self, message: &Message, response: &str) -> Result<(), BotError> {
        match self.channels.get(&message.channel) {
            Some(channel) => channel.say(message, response).await,
            None => Ok(()),
        }
    }

    pub async fn reply(&self, message: &Message, response: &str) -> Result<(), BotError> {
        match self.channels.get(&message.channel) {
            Some(channel) => channel.reply(message, response).await,
            None => Ok(()),
        }
    }

    pub async fn action(&self, message: &Message, response: &str) -> Result<(), BotError> {
        match self.channels.get(&message.channel) {
            Some(channel) => channel.action(message, response).await,
            None => Ok(()),
        }
    }
}
