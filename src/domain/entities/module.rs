use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::ActionInfo;

/// Hook run when a module is unloaded
pub trait ModuleHooks: Send + Sync {
    fn unload(&self);
}

/// A named provider of actions with its own scoped configuration
pub struct Module {
    pub name: String,
    pub description: String,
    pub config: serde_yaml::Value,
    hooks: Option<Arc<dyn ModuleHooks>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            config: serde_yaml::Value::Null,
            hooks: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_config(mut self, config: serde_yaml::Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ModuleHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Look up a string setting in the module config
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_str())
    }

    pub fn unload(&self) {
        if let Some(hooks) = &self.hooks {
            hooks.unload();
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Serializable snapshot of a module and its actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub description: String,
    pub actions: Vec<ActionInfo>,
}
