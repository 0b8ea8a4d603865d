use async_trait::async_trait;
use crate::application::errors::StorageError;

/// Brain trait - key/value persistence for the user and group collections
#[async_trait]
pub trait Brain: Send + Sync {
    /// Prepare the backing store
    async fn wake(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Flush and release the backing store
    async fn sleep(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn remember(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError>;
    async fn retrieve(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;
    async fn forget(&self, key: &str) -> Result<(), StorageError>;
}
