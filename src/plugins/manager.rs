//! Plugin manager - handles module lifecycle

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{error, info, warn};

use crate::application::errors::BotError;
use crate::application::services::{ActionRegistry, Loaded};
use crate::domain::entities::{Module, ModuleHooks};
use crate::infrastructure::config::ModulesConfig;
use crate::plugins::trait_def::Plugin;

/// Runs the plugin's cleanup when its module is unloaded
struct PluginHooks(Arc<dyn Plugin>);

impl ModuleHooks for PluginHooks {
    fn unload(&self) {
        self.0.cleanup();
    }
}

fn poisoned<T>(_: T) -> BotError {
    BotError::Internal("Lock poisoned".to_string())
}

/// Turns registered plugins into loaded modules
pub struct PluginManager {
    registry: Arc<ActionRegistry>,
    plugins: RwLock<Vec<Arc<dyn Plugin>>>,
    config: ModulesConfig,
}

impl PluginManager {
    pub fn new(registry: Arc<ActionRegistry>, config: ModulesConfig) -> Self {
        Self {
            registry,
            plugins: RwLock::new(Vec::new()),
            config,
        }
    }

    /// Add a plugin to the factory table. Load order follows registration order.
    pub fn register<P: Plugin + 'static>(&self, plugin: P) -> Result<(), BotError> {
        let name = plugin.name().to_string();
        let mut plugins = self.plugins.write().map_err(poisoned)?;

        if plugins.iter().any(|p| p.name() == name) {
            return Err(BotError::Plugin(format!("Plugin '{}' already registered", name)));
        }

        info!("Registering plugin: {}", name);
        plugins.push(Arc::new(plugin));
        Ok(())
    }

    fn plugin(&self, name: &str) -> Result<Option<Arc<dyn Plugin>>, BotError> {
        let plugins = self.plugins.read().map_err(poisoned)?;
        Ok(plugins.iter().find(|p| p.name() == name).cloned())
    }

    /// Load one plugin as a module and register its actions.
    ///
    /// Returns `None` when the module is excluded by config. Loading a module
    /// that is already loaded returns the existing one.
    pub fn load(&self, name: &str) -> Result<Option<Arc<Module>>, BotError> {
        if self.config.is_excluded(name) {
            info!("Module {} excluded by config", name);
            return Ok(None);
        }

        let plugin = self
            .plugin(name)?
            .ok_or_else(|| BotError::Plugin(format!("Plugin '{}' not found", name)))?;

        if let Some(module) = self.registry.module(name) {
            return Ok(Some(module));
        }

        let module = Module::new(name)
            .with_description(plugin.description())
            .with_config(self.config.settings_for(name))
            .with_hooks(Arc::new(PluginHooks(plugin.clone())));

        // Only the caller that inserted the module registers its actions
        let module = match self.registry.insert_module(module)? {
            Loaded::New(module) => module,
            Loaded::Existing(module) => return Ok(Some(module)),
        };

        for spec in plugin.actions(&module) {
            if let Err(e) = self.registry.register(name, spec) {
                error!("Module {} failed to register an action: {}", name, e);
                self.registry.unregister(name)?;
                return Err(e.into());
            }
        }

        Ok(Some(module))
    }

    /// Load every registered plugin, returning the names that loaded.
    /// A plugin that fails is logged and skipped.
    pub fn load_all(&self) -> Result<Vec<String>, BotError> {
        let names: Vec<String> = {
            let plugins = self.plugins.read().map_err(poisoned)?;
            plugins.iter().map(|p| p.name().to_string()).collect()
        };

        let mut loaded = Vec::new();
        for name in names {
            match self.load(&name) {
                Ok(Some(_)) => loaded.push(name),
                Ok(None) => {}
                Err(e) => warn!("Failed to load module {}: {}", name, e),
            }
        }

        info!("Loaded {} modules", loaded.len());
        Ok(loaded)
    }

    /// Unload a module: runs the plugin cleanup and removes its actions
    pub fn unload(&self, name: &str) -> Result<(), BotError> {
        self.registry.unregister(name)?;
        Ok(())
    }

    /// Unload every plugin module, most recently loaded first
    pub fn shutdown(&self) -> Result<(), BotError> {
        let mut names = self.registry.names();
        names.reverse();

        for name in names {
            if self.plugin(&name)?.is_none() {
                continue;
            }
            if let Err(e) = self.unload(&name) {
                warn!("Failed to unload module {}: {}", name, e);
            }
        }
        Ok(())
    }

    /// List all registered plugins
    pub fn list_plugins(&self) -> Result<Vec<PluginInfo>, BotError> {
        let plugins = self.plugins.read().map_err(poisoned)?;
        Ok(plugins
            .iter()
            .map(|plugin| PluginInfo {
                name: plugin.name().to_string(),
                description: plugin.description().to_string(),
                loaded: self.registry.is_loaded(plugin.name()),
                metadata: plugin.metadata(),
            })
            .collect())
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        matches!(self.plugin(name), Ok(Some(_)))
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Get config
    pub fn config(&self) -> &ModulesConfig {
        &self.config
    }
}

/// Plugin information for listing
#[derive(Debug, Clone, serde::Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub description: String,
    pub loaded: bool,
    pub metadata: HashMap<String, String>,
}
