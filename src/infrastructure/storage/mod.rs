//! Brain implementations and directory persistence

pub mod persistence;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::traits::Brain;
use crate::infrastructure::config::{BrainConfig, BrainMode};
use crate::infrastructure::database::SqliteBrain;

pub use persistence::{load_directory, seed_directory, BrainWriter};

/// Build the brain selected by the config and wake it
pub async fn open_brain(config: &BrainConfig) -> Result<Arc<dyn Brain>, StorageError> {
    let brain: Arc<dyn Brain> = match config.mode {
        BrainMode::Memory => Arc::new(MemoryBrain::new()),
        BrainMode::Json => Arc::new(JsonBrain::new(&config.path)),
        BrainMode::Sqlite => {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            Arc::new(SqliteBrain::new(&config.path)?)
        }
    };

    brain.wake().await?;
    tracing::info!("Brain ready ({}, {})", config.mode, config.path.display());
    Ok(brain)
}

/// Brain that keeps everything in memory for the life of the process
#[derive(Default)]
pub struct MemoryBrain {
    data: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl MemoryBrain {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Brain for MemoryBrain {
    async fn remember(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.insert(key.to_string(), value);
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn forget(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.remove(key);
        Ok(())
    }
}

/// JSON file-based brain, one `<key>.json` file per key
pub struct JsonBrain {
    base_path: PathBuf,
}

impl JsonBrain {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file = key.replace(['/', '\\'], "_");
        self.base_path.join(format!("{}.json", file))
    }
}

#[async_trait]
impl Brain for JsonBrain {
    async fn wake(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    async fn remember(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(&value)?;
        tokio::fs::write(self.path_for(key), content).await?;
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn forget(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_brain() {
        let brain = MemoryBrain::new();
        brain.remember("groups", json!([])).await.unwrap();
        assert_eq!(brain.retrieve("groups").await.unwrap(), Some(json!([])));
        brain.forget("groups").await.unwrap();
        assert_eq!(brain.retrieve("groups").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_json_brain_files() {
        let dir = std::env::temp_dir().join(format!("jarvis-brain-{}", uuid::Uuid::new_v4()));
        let brain = JsonBrain::new(&dir);
        brain.wake().await.unwrap();

        assert_eq!(brain.retrieve("users").await.unwrap(), None);
        brain.remember("users", json!([{"name": "alex"}])).await.unwrap();
        assert!(dir.join("users.json").exists());
        assert_eq!(
            brain.retrieve("users").await.unwrap(),
            Some(json!([{"name": "alex"}]))
        );

        brain.forget("users").await.unwrap();
        brain.forget("users").await.unwrap();
        assert!(!dir.join("users.json").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_open_sqlite_brain() {
        let dir = std::env::temp_dir().join(format!("jarvis-brain-{}", uuid::Uuid::new_v4()));
        let config = BrainConfig {
            mode: BrainMode::Sqlite,
            path: dir.join("brain.db"),
        };

        let brain = open_brain(&config).await.unwrap();
        brain.remember("users", json!([])).await.unwrap();
        assert_eq!(brain.retrieve("users").await.unwrap(), Some(json!([])));
        assert!(config.path.exists());

        drop(brain);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
