//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::application::errors::ConfigError;
use crate::domain::entities::{Group, User};

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub modules: ModulesConfig,
    #[serde(default)]
    pub brain: BrainConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    /// Console lines starting with this are addressed to the bot
    pub prefix: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Which modules load and what each one is configured with
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModulesConfig {
    /// Module names to skip, `"*"` skips all of them
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub settings: HashMap<String, serde_yaml::Value>,
}

impl ModulesConfig {
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|e| e == "*" || e == name)
    }

    /// Scoped config for a module, `Null` when none is set
    pub fn settings_for(&self, name: &str) -> serde_yaml::Value {
        self.settings.get(name).cloned().unwrap_or(serde_yaml::Value::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrainMode {
    #[default]
    Memory,
    Json,
    Sqlite,
}

impl FromStr for BrainMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(BrainMode::Memory),
            "json" => Ok(BrainMode::Json),
            "sqlite" => Ok(BrainMode::Sqlite),
            other => Err(ConfigError::InvalidValue(format!("Unknown brain mode: {}", other))),
        }
    }
}

impl fmt::Display for BrainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrainMode::Memory => write!(f, "memory"),
            BrainMode::Json => write!(f, "json"),
            BrainMode::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BrainConfig {
    pub mode: BrainMode,
    /// Directory for `json`, database file for `sqlite`
    pub path: PathBuf,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            mode: BrainMode::Memory,
            path: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    /// Identity console messages are sent as
    pub identity: String,
    pub channel: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            identity: "console@local".to_string(),
            channel: "console".to_string(),
        }
    }
}

/// Users and groups added at boot when the directory does not have them.
/// Permissions are exact (`module:action`) or per module (`module:*`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DirectoryConfig {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "jarvis".to_string(),
                prefix: "!".to_string(),
                log_level: default_log_level(),
            },
            modules: ModulesConfig::default(),
            brain: BrainConfig::default(),
            console: ConsoleConfig::default(),
            directory: DirectoryConfig {
                users: vec![User::new("owner")
                    .with_identity("console@local")
                    .with_permission("core:*")],
                groups: Vec::new(),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn load_env() -> Result<Self, ConfigError> {
        Config::default().with_env()
    }

    /// Apply `JARVIS_*` environment overrides
    pub fn with_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(name) = std::env::var("JARVIS_NAME") {
            self.bot.name = name;
        }

        if let Ok(prefix) = std::env::var("JARVIS_PREFIX") {
            self.bot.prefix = prefix;
        }

        if let Ok(level) = std::env::var("JARVIS_LOG_LEVEL") {
            self.bot.log_level = level;
        }

        if let Ok(mode) = std::env::var("JARVIS_BRAIN_MODE") {
            self.brain.mode = mode.parse()?;
        }

        if let Ok(path) = std::env::var("JARVIS_BRAIN_PATH") {
            self.brain.path = PathBuf::from(path);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.name.trim().is_empty() {
            return Err(ConfigError::MissingField("bot.name".to_string()));
        }
        if self.bot.prefix.is_empty() {
            return Err(ConfigError::MissingField("bot.prefix".to_string()));
        }
        if self.console.identity.is_empty() {
            return Err(ConfigError::MissingField("console.identity".to_string()));
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
