use std::fmt;
use std::sync::Arc;

use super::Message;
use crate::application::errors::BotError;
use crate::domain::traits::Channel;

/// Everything a handler receives when its action fires
#[derive(Clone)]
pub struct Invocation {
    pub message: Message,
    /// Unquoted captures in pattern order, `None` for absent optional slots
    pub args: Vec<Option<String>>,
    pub module: String,
    pub action: String,
    channel: Option<Arc<dyn Channel>>,
}

impl Invocation {
    pub fn new(
        message: Message,
        args: Vec<Option<String>>,
        module: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            message,
            args,
            module: module.into(),
            action: action.into(),
            channel: None,
        }
    }

    pub fn with_channel(mut self, channel: Option<Arc<dyn Channel>>) -> Self {
        self.channel = channel;
        self
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(|a| a.as_deref())
    }

    pub fn permission(&self) -> String {
        format!("{}:{}", self.module, self.action)
    }

    pub async fn say(&self, response: &str) -> Result<(), BotError> {
        match &self.channel {
            Some(channel) => channel.say(&self.message, response).await,
            None => {
                tracing::debug!("No channel {} for say", self.message.channel);
                Ok(())
            }
        }
    }

    pub async fn reply(&self, response: &str) -> Result<(), BotError> {
        match &self.channel {
            Some(channel) => channel.reply(&self.message, response).await,
            None => {
                tracing::debug!("No channel {} for reply", self.message.channel);
                Ok(())
            }
        }
    }

    pub async fn action(&self, response: &str) -> Result<(), BotError> {
        match &self.channel {
            Some(channel) => channel.action(&self.message, response).await,
            None => {
                tracing::debug!("No channel {} for action", self.message.channel);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("message", &self.message)
            .field("args", &self.args)
            .field("module", &self.module)
            .field("action", &self.action)
            .finish()
    }
}
