use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use super::Invocation;
use crate::application::errors::{BotError, RegistryError};
use crate::application::messaging::pattern::{CompiledPattern, PatternOptions, PatternSource};

/// Result returned by action handlers
pub type HandlerResult = Result<(), BotError>;

/// Commands answer only direct address, triggers answer any matching message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Command,
    Trigger,
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Command => "command",
            ActionKind::Trigger => "trigger",
        }
    }
}

impl FromStr for ActionKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "command" => Ok(ActionKind::Command),
            "trigger" => Ok(ActionKind::Trigger),
            other => Err(RegistryError::InvalidActionKind(other.to_string())),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code run when an action is selected and authorized
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, invocation: Invocation) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> ActionHandler for F
where
    F: Fn(Invocation) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, invocation: Invocation) -> HandlerResult {
        (self)(invocation).await
    }
}

/// Definition of an action as written by a module author.
///
/// One definition may carry several match patterns; registration produces
/// one [`Action`] per pattern.
#[derive(Clone)]
pub struct ActionSpec {
    pub name: String,
    pub kind: Option<ActionKind>,
    pub patterns: Vec<PatternSource>,
    pub options: PatternOptions,
    pub handler: Option<Arc<dyn ActionHandler>>,
    pub secure: bool,
    pub description: String,
    pub example: String,
}

impl ActionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            patterns: Vec::new(),
            options: PatternOptions::default(),
            handler: None,
            secure: false,
            description: String::new(),
            example: String::new(),
        }
    }

    pub fn command(name: impl Into<String>) -> Self {
        Self::new(name).with_kind(ActionKind::Command)
    }

    pub fn trigger(name: impl Into<String>) -> Self {
        Self::new(name).with_kind(ActionKind::Trigger)
    }

    pub fn with_kind(mut self, kind: ActionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Add a match pattern; call repeatedly for alternatives
    pub fn matching(mut self, pattern: impl Into<PatternSource>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn with_options(mut self, options: PatternOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_handler<H: ActionHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Require a permission check before the handler runs
    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("patterns", &self.patterns)
            .field("secure", &self.secure)
            .finish()
    }
}

/// A registered action bound to exactly one compiled pattern
pub struct Action {
    pub module: String,
    pub name: String,
    pub kind: ActionKind,
    pub pattern: CompiledPattern,
    pub handler: Arc<dyn ActionHandler>,
    pub secure: bool,
    pub description: String,
    pub example: String,
}

impl Action {
    /// Permission string guarding this action
    pub fn permission(&self) -> String {
        format!("{}:{}", self.module, self.name)
    }

    pub fn info(&self) -> ActionInfo {
        ActionInfo {
            module: self.module.clone(),
            name: self.name.clone(),
            kind: self.kind,
            pattern: self.pattern.to_string(),
            secure: self.secure,
            description: self.description.clone(),
            example: self.example.clone(),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("module", &self.module)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("pattern", &self.pattern.as_str())
            .field("secure", &self.secure)
            .finish()
    }
}

/// Serializable snapshot of an action, pattern rendered as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionInfo {
    pub module: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(rename = "match")]
    pub pattern: String,
    pub secure: bool,
    pub description: String,
    pub example: String,
}
