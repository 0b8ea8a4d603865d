//! Action registry - Loaded modules and their compiled actions
//!
//! Modules and actions are kept in registration order; the dispatcher relies
//! on that order for its tie-breaks.

use std::sync::{Arc, RwLock};

use crate::application::errors::RegistryError;
use crate::application::messaging::pattern::CompiledPattern;
use crate::domain::entities::{Action, ActionInfo, ActionSpec, Module, ModuleInfo};

/// A loaded module with the actions registered under it
pub struct ModuleEntry {
    pub module: Arc<Module>,
    pub actions: Vec<Arc<Action>>,
}

/// Result of inserting a module
#[derive(Debug, Clone)]
pub enum Loaded {
    New(Arc<Module>),
    Existing(Arc<Module>),
}

impl Loaded {
    pub fn is_new(&self) -> bool {
        matches!(self, Loaded::New(_))
    }

    pub fn into_module(self) -> Arc<Module> {
        match self {
            Loaded::New(module) | Loaded::Existing(module) => module,
        }
    }
}

/// Registry change notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    ModuleLoaded(String),
    ModuleUnloaded(String),
    ActionRegistered(ActionInfo),
}

/// Observer of registry changes
pub trait RegistryListener: Send + Sync {
    fn on_event(&self, event: &RegistryEvent);
}

/// Registry for loaded modules and their actions
pub struct ActionRegistry {
    modules: RwLock<Vec<ModuleEntry>>,
    listeners: RwLock<Vec<Arc<dyn RegistryListener>>>,
}

fn poisoned<T>(_: T) -> RegistryError {
    RegistryError::Internal("Lock poisoned".to_string())
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            modules: RwLock::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn RegistryListener>) -> Result<(), RegistryError> {
        self.listeners.write().map_err(poisoned)?.push(listener);
        Ok(())
    }

    fn emit(&self, events: &[RegistryEvent]) {
        let listeners = match self.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(_) => return,
        };
        for event in events {
            for listener in &listeners {
                listener.on_event(event);
            }
        }
    }

    /// Add a module. Loading a name that is already present returns the
    /// module already registered under it.
    pub fn load_module(&self, module: Module) -> Result<Arc<Module>, RegistryError> {
        Ok(self.insert_module(module)?.into_module())
    }

    /// Like [`load_module`](Self::load_module), but tells the caller whether
    /// this call inserted the module. Exactly one of several concurrent
    /// callers for the same name gets [`Loaded::New`].
    pub fn insert_module(&self, module: Module) -> Result<Loaded, RegistryError> {
        let name = module.name.clone();
        let module = {
            let mut modules = self.modules.write().map_err(poisoned)?;
            if let Some(entry) = modules.iter().find(|e| e.module.name == name) {
                tracing::debug!("Module {} already loaded", name);
                return Ok(Loaded::Existing(entry.module.clone()));
            }

            let module = Arc::new(module);
            modules.push(ModuleEntry {
                module: module.clone(),
                actions: Vec::new(),
            });
            module
        };

        tracing::info!("Loaded module: {}", name);
        self.emit(&[RegistryEvent::ModuleLoaded(name)]);
        Ok(Loaded::New(module))
    }

    /// Compile an action definition and append one action per pattern to the module
    pub fn register(&self, module_name: &str, spec: ActionSpec) -> Result<Vec<Arc<Action>>, RegistryError> {
        let kind = spec
            .kind
            .ok_or_else(|| RegistryError::InvalidActionKind(spec.name.clone()))?;
        let handler = spec
            .handler
            .clone()
            .ok_or_else(|| RegistryError::MissingHandler(spec.name.clone()))?;

        if spec.patterns.is_empty() {
            tracing::warn!("Action {}:{} has no patterns", module_name, spec.name);
        }

        let mut actions = Vec::with_capacity(spec.patterns.len());
        for source in &spec.patterns {
            let pattern = CompiledPattern::compile(source, spec.options)?;
            actions.push(Arc::new(Action {
                module: module_name.to_string(),
                name: spec.name.clone(),
                kind,
                pattern,
                handler: handler.clone(),
                secure: spec.secure,
                description: spec.description.clone(),
                example: spec.example.clone(),
            }));
        }

        {
            let mut modules = self.modules.write().map_err(poisoned)?;
            let entry = modules
                .iter_mut()
                .find(|e| e.module.name == module_name)
                .ok_or_else(|| RegistryError::ModuleNotFound(module_name.to_string()))?;
            entry.actions.extend(actions.iter().cloned());
        }

        let events: Vec<RegistryEvent> = actions
            .iter()
            .map(|action| {
                tracing::info!("Registered {} {} as {}", action.kind, action.permission(), action.pattern);
                RegistryEvent::ActionRegistered(action.info())
            })
            .collect();
        self.emit(&events);

        Ok(actions)
    }

    /// Remove a module and every action it registered, then run its unload hook
    pub fn unregister(&self, name: &str) -> Result<Arc<Module>, RegistryError> {
        let entry = {
            let mut modules = self.modules.write().map_err(poisoned)?;
            let index = modules
                .iter()
                .position(|e| e.module.name == name)
                .ok_or_else(|| RegistryError::ModuleNotFound(name.to_string()))?;
            modules.remove(index)
        };

        entry.module.unload();
        tracing::info!("Unloaded module: {} ({} actions)", name, entry.actions.len());
        self.emit(&[RegistryEvent::ModuleUnloaded(name.to_string())]);
        Ok(entry.module)
    }

    /// Get a module by name
    pub fn module(&self, name: &str) -> Option<Arc<Module>> {
        self.modules
            .read()
            .ok()?
            .iter()
            .find(|e| e.module.name == name)
            .map(|e| e.module.clone())
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.module(name).is_some()
    }

    /// Module names in registration order
    pub fn names(&self) -> Vec<String> {
        self.modules
            .read()
            .ok()
            .map(|m| m.iter().map(|e| e.module.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn list_modules(&self) -> Result<Vec<ModuleInfo>, RegistryError> {
        let modules = self.modules.read().map_err(poisoned)?;
        Ok(modules
            .iter()
            .map(|e| ModuleInfo {
                name: e.module.name.clone(),
                description: e.module.description.clone(),
                actions: e.actions.iter().map(|a| a.info()).collect(),
            })
            .collect())
    }

    pub fn list_actions(&self) -> Result<Vec<ActionInfo>, RegistryError> {
        let modules = self.modules.read().map_err(poisoned)?;
        Ok(modules
            .iter()
            .flat_map(|e| e.actions.iter().map(|a| a.info()))
            .collect())
    }

    /// Run `f` over a consistent view of the modules, in registration order
    pub fn scan<R>(&self, f: impl FnOnce(&[ModuleEntry]) -> R) -> Result<R, RegistryError> {
        let modules = self.modules.read().map_err(poisoned)?;
        Ok(f(modules.as_slice()))
    }

    /// Get the number of loaded modules
    pub fn len(&self) -> usize {
        self.modules.read().ok().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ActionKind, Invocation, ModuleHooks};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    async fn noop(_: Invocation) -> Result<(), crate::application::errors::BotError> {
        Ok(())
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<RegistryEvent>>);

    impl RegistryListener for Recorder {
        fn on_event(&self, event: &RegistryEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    struct CountUnloads(AtomicUsize);

    impl ModuleHooks for CountUnloads {
        fn unload(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_one_action_per_pattern() {
        let registry = ActionRegistry::new();
        registry.load_module(Module::new("greetings")).unwrap();

        let spec = ActionSpec::trigger("hello")
            .matching("hello")
            .matching("hi")
            .matching("hey :name")
            .with_handler(noop);
        let actions = registry.register("greetings", spec).unwrap();

        assert_eq!(actions.len(), 3);
        assert!(actions.iter().all(|a| a.kind == ActionKind::Trigger));
        assert_eq!(registry.list_actions().unwrap().len(), 3);
        assert_eq!(actions[2].permission(), "greetings:hello");
    }

    #[test]
    fn test_missing_kind_is_rejected() {
        let registry = ActionRegistry::new();
        registry.load_module(Module::new("m")).unwrap();

        let spec = ActionSpec::new("broken").matching("x").with_handler(noop);
        let err = registry.register("m", spec).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidActionKind(name) if name == "broken"));
        assert!(registry.list_actions().unwrap().is_empty());
    }

    #[test]
    fn test_bad_pattern_registers_nothing() {
        let registry = ActionRegistry::new();
        registry.load_module(Module::new("m")).unwrap();

        let spec = ActionSpec::command("pick")
            .matching("pick :a")
            .matching("pick :?a :b")
            .with_handler(noop);
        assert!(matches!(
            registry.register("m", spec),
            Err(RegistryError::InvalidPattern(_))
        ));
        assert!(registry.list_actions().unwrap().is_empty());
    }

    #[test]
    fn test_register_into_unknown_module() {
        let registry = ActionRegistry::new();
        let spec = ActionSpec::command("x").matching("x").with_handler(noop);
        assert!(matches!(
            registry.register("ghost", spec),
            Err(RegistryError::ModuleNotFound(_))
        ));
    }

    #[test]
    fn test_load_module_is_idempotent() {
        let registry = ActionRegistry::new();
        let first = registry.load_module(Module::new("weather").with_description("first")).unwrap();
        registry
            .register("weather", ActionSpec::command("forecast").matching("forecast").with_handler(noop))
            .unwrap();

        let second = registry.load_module(Module::new("weather").with_description("second")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.description, "first");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list_actions().unwrap().len(), 1);
    }

    #[test]
    fn test_insert_module_reports_first_load() {
        let registry = ActionRegistry::new();
        assert!(registry.insert_module(Module::new("weather")).unwrap().is_new());

        let again = registry.insert_module(Module::new("weather")).unwrap();
        assert!(!again.is_new());
        assert_eq!(again.into_module().name, "weather");
    }

    #[test]
    fn test_unregister_runs_hook_and_removes_actions() {
        let registry = ActionRegistry::new();
        let hooks = Arc::new(CountUnloads(AtomicUsize::new(0)));
        registry
            .load_module(Module::new("timer").with_hooks(hooks.clone()))
            .unwrap();
        registry
            .register("timer", ActionSpec::command("start").matching("start timer").with_handler(noop))
            .unwrap();

        registry.unregister("timer").unwrap();
        assert_eq!(hooks.0.load(Ordering::SeqCst), 1);
        assert!(!registry.is_loaded("timer"));
        assert!(registry.list_actions().unwrap().is_empty());
        assert!(matches!(
            registry.unregister("timer"),
            Err(RegistryError::ModuleNotFound(_))
        ));
    }

    #[test]
    fn test_events_are_emitted() {
        let registry = ActionRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.subscribe(recorder.clone()).unwrap();

        registry.load_module(Module::new("m")).unwrap();
        registry
            .register("m", ActionSpec::trigger("t").matching("a").matching("b").with_handler(noop))
            .unwrap();
        registry.unregister("m").unwrap();

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], RegistryEvent::ModuleLoaded("m".to_string()));
        assert!(matches!(&events[1], RegistryEvent::ActionRegistered(info) if info.pattern == "/^a$/i"));
        assert!(matches!(&events[2], RegistryEvent::ActionRegistered(info) if info.pattern == "/^b$/i"));
        assert_eq!(events[3], RegistryEvent::ModuleUnloaded("m".to_string()));
    }

    #[test]
    fn test_list_modules_serializes_patterns() {
        let registry = ActionRegistry::new();
        registry.load_module(Module::new("notes")).unwrap();
        registry
            .register(
                "notes",
                ActionSpec::command("add")
                    .matching("note :text")
                    .with_description("Store a note")
                    .with_handler(noop),
            )
            .unwrap();

        let modules = registry.list_modules().unwrap();
        assert_eq!(modules.len(), 1);
        let json = serde_json::to_value(&modules).unwrap();
        assert_eq!(json[0]["name"], "notes");
        assert_eq!(json[0]["actions"][0]["type"], "command");
        assert_eq!(json[0]["actions"][0]["match"], "/^note (.+)$/i");
        assert_eq!(json[0]["actions"][0]["description"], "Store a note");
    }
}
