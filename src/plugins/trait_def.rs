//! Plugin trait definitions

use std::collections::HashMap;

use crate::domain::entities::{ActionSpec, Module};

/// A module factory: knows its name and the actions it contributes
pub trait Plugin: Send + Sync {
    /// Unique identifier, also the module name and permission prefix
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Action definitions for a freshly loaded module.
    /// `module.config` holds the module's settings from the config file.
    fn actions(&self, module: &Module) -> Vec<ActionSpec>;

    /// Optional: Cleanup resources when the module is unloaded
    fn cleanup(&self) {}

    /// Optional: Get plugin metadata
    fn metadata(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}
