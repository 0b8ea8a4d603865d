//! SQLite brain - Persists brain keys in a single key/value table

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use crate::application::errors::StorageError;
use crate::domain::traits::Brain;

pub struct SqliteBrain {
    conn: Mutex<Connection>,
}

impl SqliteBrain {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Brain backed by a private in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        let brain = Self {
            conn: Mutex::new(conn),
        };
        brain.init_tables()?;
        Ok(brain)
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        self.lock()?.execute(
            "CREATE TABLE IF NOT EXISTS brain (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("Lock poisoned".to_string()))
    }
}

#[async_trait]
impl Brain for SqliteBrain {
    async fn remember(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(&value)?;
        self.lock()?.execute(
            "INSERT OR REPLACE INTO brain (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            rusqlite::params![key, text],
        )?;
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let text: Option<String> = self
            .lock()?
            .query_row("SELECT value FROM brain WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;

        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn forget(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.execute("DELETE FROM brain WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_remember_retrieve_forget() {
        let brain = SqliteBrain::in_memory().unwrap();
        assert_eq!(brain.retrieve("users").await.unwrap(), None);

        brain.remember("users", json!([{"name": "alex"}])).await.unwrap();
        brain.remember("users", json!([{"name": "paul"}])).await.unwrap();
        assert_eq!(
            brain.retrieve("users").await.unwrap(),
            Some(json!([{"name": "paul"}]))
        );

        brain.forget("users").await.unwrap();
        assert_eq!(brain.retrieve("users").await.unwrap(), None);
    }
}
