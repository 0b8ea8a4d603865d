//! Channel registry - Transports the bot can answer through

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::traits::Channel;

/// Registry of live channels keyed by id
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, Arc<dyn Channel>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Add a channel, replacing any channel with the same id
    pub fn add(&self, channel: Arc<dyn Channel>) -> Option<Arc<dyn Channel>> {
        let id = channel.id().to_string();
        tracing::info!("Channel added: {}", id);
        self.channels.write().ok()?.insert(id, channel)
    }

    pub fn remove(&self, id: &str) -> Option<Arc<dyn Channel>> {
        let removed = self.channels.write().ok()?.remove(id);
        if removed.is_some() {
            tracing::info!("Channel removed: {}", id);
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Channel>> {
        self.channels.read().ok()?.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.channels
            .read()
            .ok()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
