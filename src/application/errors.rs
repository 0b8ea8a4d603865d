//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Handler error: {0}")]
    Handler(String),

    #[error("Plugin error: {0}")]
    Plugin(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Pattern compilation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("Required capture after optional capture in pattern: {0}")]
    RequiredAfterOptional(String),
}

/// Action registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid action type for action: {0}")]
    InvalidActionKind(String),

    #[error("Action has no handler: {0}")]
    MissingHandler(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),

    #[error("Module not loaded: {0}")]
    ModuleNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// User and group management errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
