//! Built-in `core` module

use std::sync::Arc;

use crate::application::services::ActionRegistry;
use crate::domain::entities::{ActionInfo, ActionSpec, HandlerResult, Invocation, Module};
use crate::plugins::trait_def::Plugin;

/// Provides `help` and `version`
pub struct CorePlugin {
    registry: Arc<ActionRegistry>,
    bot_name: String,
}

impl CorePlugin {
    pub fn new(registry: Arc<ActionRegistry>, bot_name: impl Into<String>) -> Self {
        Self {
            registry,
            bot_name: bot_name.into(),
        }
    }
}

/// One line per action, alternatives of the same action collapsed
pub fn help_text(actions: &[ActionInfo], module: Option<&str>) -> String {
    let mut seen: Vec<(&str, &str)> = Vec::new();
    let mut lines = Vec::new();

    for action in actions {
        if module.is_some_and(|m| !m.eq_ignore_ascii_case(&action.module)) {
            continue;
        }
        let key = (action.module.as_str(), action.name.as_str());
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);

        let mut line = format!("{}:{} ({})", action.module, action.name, action.kind);
        if !action.description.is_empty() {
            line.push_str(" - ");
            line.push_str(&action.description);
        }
        if !action.example.is_empty() {
            line.push_str(&format!(" e.g. \"{}\"", action.example));
        }
        lines.push(line);
    }

    if lines.is_empty() {
        return "No actions available".to_string();
    }
    lines.join("\n")
}

async fn reply_help(registry: Arc<ActionRegistry>, invocation: Invocation) -> HandlerResult {
    let actions = registry.list_actions()?;
    invocation.reply(&help_text(&actions, invocation.arg(0))).await
}

impl Plugin for CorePlugin {
    fn name(&self) -> &str {
        "core"
    }

    fn description(&self) -> &str {
        "Help and version information"
    }

    fn actions(&self, _module: &Module) -> Vec<ActionSpec> {
        let registry = self.registry.clone();
        let help = move |invocation: Invocation| reply_help(registry.clone(), invocation);

        let version = format!("{} v{}", self.bot_name, env!("CARGO_PKG_VERSION"));
        let version_handler = move |invocation: Invocation| {
            let version = version.clone();
            async move { invocation.reply(&version).await }
        };

        vec![
            ActionSpec::command("help")
                .matching("help :?module")
                .with_description("List available actions")
                .with_example("help notes")
                .with_handler(help),
            ActionSpec::command("version")
                .matching("version")
                .with_description("Show the bot version")
                .with_example("version")
                .with_handler(version_handler),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ActionKind;

    fn info(module: &str, name: &str, description: &str) -> ActionInfo {
        ActionInfo {
            module: module.to_string(),
            name: name.to_string(),
            kind: ActionKind::Command,
            pattern: "/^x$/i".to_string(),
            secure: false,
            description: description.to_string(),
            example: String::new(),
        }
    }

    #[test]
    fn test_help_collapses_alternatives() {
        let actions = vec![
            info("notes", "add", "Add a note"),
            info("notes", "add", "Add a note"),
            info("core", "help", ""),
        ];
        assert_eq!(
            help_text(&actions, None),
            "notes:add (command) - Add a note\ncore:help (command)"
        );
        assert_eq!(help_text(&actions, Some("core")), "core:help (command)");
        assert_eq!(help_text(&actions, Some("weather")), "No actions available");
    }

    #[test]
    fn test_core_actions_register() {
        let registry = Arc::new(ActionRegistry::new());
        let plugin = CorePlugin::new(registry.clone(), "jarvis");
        let module = registry.load_module(Module::new("core")).unwrap();
        for spec in plugin.actions(&module) {
            registry.register("core", spec).unwrap();
        }

        let names: Vec<String> = registry.list_actions().unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["help", "version"]);
    }
}
