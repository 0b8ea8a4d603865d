//! Keeps the directory and a brain in step

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::application::errors::{BotError, DirectoryError, StorageError};
use crate::application::services::{Collection, Directory, DirectoryEvent, DirectoryListener, DirectorySnapshot};
use crate::domain::entities::{Group, User};
use crate::domain::traits::Brain;

/// Load the stored user and group collections into the directory
pub async fn load_directory(brain: &dyn Brain, directory: &Directory) -> Result<(), BotError> {
    let users: Vec<User> = match brain.retrieve(Collection::Users.key()).await? {
        Some(value) => serde_json::from_value(value).map_err(StorageError::from)?,
        None => Vec::new(),
    };
    let groups: Vec<Group> = match brain.retrieve(Collection::Groups.key()).await? {
        Some(value) => serde_json::from_value(value).map_err(StorageError::from)?,
        None => Vec::new(),
    };

    directory.restore(users, groups)?;
    Ok(())
}

/// Add configured users and groups that are not in the directory yet.
/// Existing records only gain what they are missing.
pub fn seed_directory(directory: &Directory, users: &[User], groups: &[Group]) -> Result<(), DirectoryError> {
    fn tolerate(result: Result<impl Sized, DirectoryError>) -> Result<(), DirectoryError> {
        match result {
            Ok(_) | Err(DirectoryError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    for user in users {
        tolerate(directory.add_user(&user.name))?;
        for identity in &user.identities {
            if let Err(DirectoryError::Conflict(msg)) = directory.add_identity(&user.name, identity) {
                tracing::debug!("Seed identity skipped: {}", msg);
            }
        }
        for permission in &user.permissions {
            tolerate(directory.add_user_permission(&user.name, permission))?;
        }
    }

    for group in groups {
        tolerate(directory.add_group(&group.name))?;
        for username in &group.users {
            match directory.add_group_user(&group.name, username) {
                Ok(_) | Err(DirectoryError::Conflict(_)) => {}
                Err(DirectoryError::NotFound(msg)) => tracing::warn!("Seed membership skipped: {}", msg),
                Err(e) => return Err(e),
            }
        }
        for permission in &group.permissions {
            tolerate(directory.add_group_permission(&group.name, permission))?;
        }
    }

    Ok(())
}

/// Directory listener that saves the changed collection to a brain.
///
/// Saves run in order on a background task; the listener itself never blocks.
pub struct BrainWriter {
    tx: mpsc::UnboundedSender<(Collection, serde_json::Value)>,
}

impl BrainWriter {
    /// Start the writer task. It stops once the writer is dropped.
    pub fn spawn(brain: Arc<dyn Brain>) -> (Arc<Self>, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<(Collection, serde_json::Value)>();

        let handle = tokio::spawn(async move {
            while let Some((collection, value)) = rx.recv().await {
                match brain.remember(collection.key(), value).await {
                    Ok(()) => tracing::debug!("Saved {}", collection.key()),
                    Err(e) => tracing::error!("Failed to save {}: {}", collection.key(), e),
                }
            }
        });

        (Arc::new(Self { tx }), handle)
    }
}

impl DirectoryListener for BrainWriter {
    fn on_change(&self, event: &DirectoryEvent, snapshot: &DirectorySnapshot) {
        let collection = event.collection();
        let value = match collection {
            Collection::Users => serde_json::to_value(&snapshot.users),
            Collection::Groups => serde_json::to_value(&snapshot.groups),
        };

        match value {
            Ok(value) => {
                if self.tx.send((collection, value)).is_err() {
                    tracing::warn!("Brain writer stopped, {} not saved", collection.key());
                }
            }
            Err(e) => tracing::error!("Failed to serialize {}: {}", collection.key(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::MemoryBrain;

    #[tokio::test]
    async fn test_changes_reach_the_brain() {
        let brain = Arc::new(MemoryBrain::new());
        let directory = Directory::new();
        let (writer, handle) = BrainWriter::spawn(brain.clone());
        directory.subscribe(writer.clone()).unwrap();

        directory.add_user("alex").unwrap();
        directory.add_identity("alex", "irc@alex").unwrap();
        directory.add_group("admins").unwrap();
        directory.add_group_user("admins", "alex").unwrap();

        drop(directory);
        drop(writer);
        handle.await.unwrap();

        let restored = Directory::new();
        load_directory(brain.as_ref(), &restored).await.unwrap();
        assert!(restored.find_user("alex").unwrap().has_identity("irc@alex"));
        assert!(restored.find_group("admins").unwrap().has_user("alex"));
    }

    #[tokio::test]
    async fn test_load_from_empty_brain() {
        let brain = MemoryBrain::new();
        let directory = Directory::new();
        directory.add_user("stale").unwrap();

        load_directory(&brain, &directory).await.unwrap();
        assert!(directory.users().unwrap().is_empty());
    }

    #[test]
    fn test_seed_is_additive() {
        let directory = Directory::new();
        directory.add_user("alex").unwrap();
        directory.add_user_permission("alex", "calendar:*").unwrap();

        let users = vec![
            User::new("alex").with_identity("irc@alex").with_permission("calendar:*"),
            User::new("paul").with_permission("notes:read"),
        ];
        let groups = vec![Group::new("admins").with_user("alex").with_user("ghost").with_permission("admin:*")];
        seed_directory(&directory, &users, &groups).unwrap();
        seed_directory(&directory, &users, &groups).unwrap();

        let alex = directory.find_user("alex").unwrap();
        assert_eq!(alex.identities, vec!["irc@alex"]);
        assert_eq!(alex.permissions, vec!["calendar:*"]);
        assert!(directory.find_user("paul").unwrap().has_permission("notes:read"));

        let admins = directory.find_group("admins").unwrap();
        assert_eq!(admins.users, vec!["alex"]);
        assert!(admins.has_permission("admin:restart"));
    }

    #[test]
    fn test_default_owner_can_use_core_actions() {
        let config = crate::infrastructure::config::Config::default();
        let directory = Arc::new(Directory::new());
        seed_directory(&directory, &config.directory.users, &config.directory.groups).unwrap();

        let resolver = crate::application::services::PermissionResolver::new(directory);
        let identity = config.console.identity.as_str();
        assert!(resolver.authorize(identity, "core:help", true));
        assert!(resolver.authorize(identity, "core:version", true));
        assert!(!resolver.authorize(identity, "notes:add", true));
    }
}
