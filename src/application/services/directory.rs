//! Directory - Users, groups and their permissions
//!
//! Every successful mutation is reported to the registered listeners after
//! the write lock has been released. Lookups and mutations that miss return
//! `DirectoryError::NotFound`; duplicates return `DirectoryError::Conflict`.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::application::errors::DirectoryError;
use crate::domain::entities::{Group, User};

/// Point-in-time copy of every user and group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
}

/// Which persisted collection a change touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Groups,
}

impl Collection {
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Groups => "groups",
        }
    }
}

/// A successful change, carrying the entity as it is after the change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    UserAdded(User),
    UserDeleted(User),
    IdentityAdded { user: User, identity: String },
    IdentityDeleted { user: User, identity: String },
    UserPermissionAdded { user: User, permission: String },
    UserPermissionDeleted { user: User, permission: String },
    GroupAdded(Group),
    GroupDeleted(Group),
    GroupUserAdded { group: Group, user: String },
    GroupUserDeleted { group: Group, user: String },
    GroupPermissionAdded { group: Group, permission: String },
    GroupPermissionDeleted { group: Group, permission: String },
}

impl DirectoryEvent {
    pub fn collection(&self) -> Collection {
        match self {
            DirectoryEvent::UserAdded(_)
            | DirectoryEvent::UserDeleted(_)
            | DirectoryEvent::IdentityAdded { .. }
            | DirectoryEvent::IdentityDeleted { .. }
            | DirectoryEvent::UserPermissionAdded { .. }
            | DirectoryEvent::UserPermissionDeleted { .. } => Collection::Users,
            _ => Collection::Groups,
        }
    }
}

/// Observer of directory changes
pub trait DirectoryListener: Send + Sync {
    fn on_change(&self, event: &DirectoryEvent, snapshot: &DirectorySnapshot);
}

/// Store of users and groups shared by the permission resolver and the
/// management surface
pub struct Directory {
    state: RwLock<DirectorySnapshot>,
    listeners: RwLock<Vec<Arc<dyn DirectoryListener>>>,
}

type Change<T> = Result<(T, Vec<DirectoryEvent>), DirectoryError>;

fn poisoned<T>(_: T) -> DirectoryError {
    DirectoryError::Internal("Lock poisoned".to_string())
}

fn user_not_found(name: &str) -> DirectoryError {
    DirectoryError::NotFound(format!("User not found with username \"{}\"", name))
}

fn group_not_found(name: &str) -> DirectoryError {
    DirectoryError::NotFound(format!("Group not found with name \"{}\"", name))
}

fn user_mut<'a>(state: &'a mut DirectorySnapshot, name: &str) -> Result<&'a mut User, DirectoryError> {
    state
        .users
        .iter_mut()
        .find(|u| u.name == name)
        .ok_or_else(|| user_not_found(name))
}

fn group_mut<'a>(state: &'a mut DirectorySnapshot, name: &str) -> Result<&'a mut Group, DirectoryError> {
    state
        .groups
        .iter_mut()
        .find(|g| g.name == name)
        .ok_or_else(|| group_not_found(name))
}

fn sanitize(users: Vec<User>, groups: Vec<Group>) -> (Vec<User>, Vec<Group>) {
    let mut names = HashSet::new();
    let mut identities = HashSet::new();
    let mut kept_users = Vec::with_capacity(users.len());

    for mut user in users {
        if !names.insert(user.name.clone()) {
            tracing::warn!("Dropping repeated user \"{}\"", user.name);
            continue;
        }
        user.identities.retain(|identity| {
            let unique = identities.insert(identity.clone());
            if !unique {
                tracing::warn!("Identity \"{}\" already belongs to another user, dropped from \"{}\"", identity, user.name);
            }
            unique
        });
        kept_users.push(user);
    }

    let mut group_names = HashSet::new();
    let mut kept_groups = Vec::with_capacity(groups.len());
    for mut group in groups {
        if !group_names.insert(group.name.clone()) {
            tracing::warn!("Dropping repeated group \"{}\"", group.name);
            continue;
        }
        group.users.retain(|member| {
            let known = names.contains(member);
            if !known {
                tracing::warn!("Group \"{}\" names unknown user \"{}\", membership dropped", group.name, member);
            }
            known
        });
        kept_groups.push(group);
    }

    (kept_users, kept_groups)
}

impl Directory {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DirectorySnapshot::default()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn DirectoryListener>) -> Result<(), DirectoryError> {
        self.listeners.write().map_err(poisoned)?.push(listener);
        Ok(())
    }

    /// Apply a change under the write lock, then notify listeners
    fn mutate<T>(&self, change: impl FnOnce(&mut DirectorySnapshot) -> Change<T>) -> Result<T, DirectoryError> {
        let (value, events, snapshot) = {
            let mut state = self.state.write().map_err(poisoned)?;
            let (value, events) = change(&mut *state)?;
            (value, events, state.clone())
        };

        let listeners = self.listeners.read().map_err(poisoned)?.clone();
        for event in &events {
            tracing::debug!("Directory change: {:?}", event);
            for listener in &listeners {
                listener.on_change(event, &snapshot);
            }
        }
        Ok(value)
    }

    /// Run `f` over a consistent view of users and groups
    pub fn read<R>(&self, f: impl FnOnce(&DirectorySnapshot) -> R) -> Result<R, DirectoryError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(f(&*state))
    }

    pub fn snapshot(&self) -> Result<DirectorySnapshot, DirectoryError> {
        self.read(|state| state.clone())
    }

    /// Replace the whole directory, e.g. with collections loaded from storage.
    /// Listeners are not notified.
    ///
    /// Records that break the directory rules are repaired with a warning:
    /// repeated user or group names keep the first record, an identity held
    /// by several users stays with the first one, and memberships naming an
    /// unknown user are dropped.
    pub fn restore(&self, users: Vec<User>, groups: Vec<Group>) -> Result<(), DirectoryError> {
        let (users, groups) = sanitize(users, groups);
        let mut state = self.state.write().map_err(poisoned)?;
        tracing::info!("Restored {} users and {} groups", users.len(), groups.len());
        *state = DirectorySnapshot { users, groups };
        Ok(())
    }

    // User operations

    pub fn users(&self) -> Result<Vec<User>, DirectoryError> {
        self.read(|state| state.users.clone())
    }

    pub fn add_user(&self, name: &str) -> Result<User, DirectoryError> {
        self.mutate(|state| {
            if state.users.iter().any(|u| u.name == name) {
                return Err(DirectoryError::Conflict("User already exists".to_string()));
            }
            let user = User::new(name);
            state.users.push(user.clone());
            Ok((user.clone(), vec![DirectoryEvent::UserAdded(user)]))
        })
    }

    pub fn find_user(&self, name: &str) -> Result<User, DirectoryError> {
        self.read(|state| state.users.iter().find(|u| u.name == name).cloned())?
            .ok_or_else(|| user_not_found(name))
    }

    /// Delete a user and drop it from every group it belonged to
    pub fn delete_user(&self, name: &str) -> Result<User, DirectoryError> {
        self.mutate(|state| {
            let index = state
                .users
                .iter()
                .position(|u| u.name == name)
                .ok_or_else(|| user_not_found(name))?;
            let user = state.users.remove(index);

            let mut events = vec![DirectoryEvent::UserDeleted(user.clone())];
            for group in state.groups.iter_mut() {
                if group.delete_user(name) {
                    events.push(DirectoryEvent::GroupUserDeleted {
                        group: group.clone(),
                        user: name.to_string(),
                    });
                }
            }
            Ok((user, events))
        })
    }

    /// The user holding `identity`, if any
    pub fn user_for_identity(&self, identity: &str) -> Result<Option<User>, DirectoryError> {
        self.read(|state| state.users.iter().find(|u| u.has_identity(identity)).cloned())
    }

    /// Attach an identity. Identities are unique across all users.
    pub fn add_identity(&self, username: &str, identity: &str) -> Result<User, DirectoryError> {
        self.mutate(|state| {
            if let Some(owner) = state.users.iter().find(|u| u.has_identity(identity)) {
                return Err(DirectoryError::Conflict(format!(
                    "User \"{}\" already has identity \"{}\"",
                    owner.name, identity
                )));
            }
            let user = user_mut(state, username)?;
            user.add_identity(identity);
            let user = user.clone();
            Ok((
                user.clone(),
                vec![DirectoryEvent::IdentityAdded {
                    user,
                    identity: identity.to_string(),
                }],
            ))
        })
    }

    pub fn delete_identity(&self, username: &str, identity: &str) -> Result<User, DirectoryError> {
        self.mutate(|state| {
            let user = user_mut(state, username)?;
            if !user.delete_identity(identity) {
                return Err(DirectoryError::NotFound(format!(
                    "User \"{}\" has no identity \"{}\"",
                    username, identity
                )));
            }
            let user = user.clone();
            Ok((
                user.clone(),
                vec![DirectoryEvent::IdentityDeleted {
                    user,
                    identity: identity.to_string(),
                }],
            ))
        })
    }

    pub fn add_user_permission(&self, username: &str, permission: &str) -> Result<User, DirectoryError> {
        self.mutate(|state| {
            let user = user_mut(state, username)?;
            if !user.add_permission(permission) {
                return Err(DirectoryError::Conflict(format!(
                    "User \"{}\" already has permission \"{}\"",
                    username, permission
                )));
            }
            let user = user.clone();
            Ok((
                user.clone(),
                vec![DirectoryEvent::UserPermissionAdded {
                    user,
                    permission: permission.to_string(),
                }],
            ))
        })
    }

    pub fn delete_user_permission(&self, username: &str, permission: &str) -> Result<User, DirectoryError> {
        self.mutate(|state| {
            let user = user_mut(state, username)?;
            if !user.delete_permission(permission) {
                return Err(DirectoryError::NotFound(format!(
                    "User \"{}\" has no permission \"{}\"",
                    username, permission
                )));
            }
            let user = user.clone();
            Ok((
                user.clone(),
                vec![DirectoryEvent::UserPermissionDeleted {
                    user,
                    permission: permission.to_string(),
                }],
            ))
        })
    }

    // Group operations

    pub fn groups(&self) -> Result<Vec<Group>, DirectoryError> {
        self.read(|state| state.groups.clone())
    }

    pub fn add_group(&self, name: &str) -> Result<Group, DirectoryError> {
        self.mutate(|state| {
            if state.groups.iter().any(|g| g.name == name) {
                return Err(DirectoryError::Conflict("Group already exists".to_string()));
            }
            let group = Group::new(name);
            state.groups.push(group.clone());
            Ok((group.clone(), vec![DirectoryEvent::GroupAdded(group)]))
        })
    }

    pub fn find_group(&self, name: &str) -> Result<Group, DirectoryError> {
        self.read(|state| state.groups.iter().find(|g| g.name == name).cloned())?
            .ok_or_else(|| group_not_found(name))
    }

    pub fn delete_group(&self, name: &str) -> Result<Group, DirectoryError> {
        self.mutate(|state| {
            let index = state
                .groups
                .iter()
                .position(|g| g.name == name)
                .ok_or_else(|| group_not_found(name))?;
            let group = state.groups.remove(index);
            Ok((group.clone(), vec![DirectoryEvent::GroupDeleted(group)]))
        })
    }

    /// Add an existing user to a group
    pub fn add_group_user(&self, group_name: &str, username: &str) -> Result<Group, DirectoryError> {
        self.mutate(|state| {
            let group = state
                .groups
                .iter()
                .find(|g| g.name == group_name)
                .ok_or_else(|| group_not_found(group_name))?;
            if group.has_user(username) {
                return Err(DirectoryError::Conflict(format!(
                    "Group \"{}\" already has user \"{}\"",
                    group_name, username
                )));
            }
            if !state.users.iter().any(|u| u.name == username) {
                return Err(user_not_found(username));
            }

            let group = group_mut(state, group_name)?;
            group.add_user(username);
            let group = group.clone();
            Ok((
                group.clone(),
                vec![DirectoryEvent::GroupUserAdded {
                    group,
                    user: username.to_string(),
                }],
            ))
        })
    }

    pub fn delete_group_user(&self, group_name: &str, username: &str) -> Result<Group, DirectoryError> {
        self.mutate(|state| {
            let group = group_mut(state, group_name)?;
            if !group.delete_user(username) {
                return Err(DirectoryError::NotFound(format!(
                    "Group \"{}\" has no user \"{}\"",
                    group_name, username
                )));
            }
            let group = group.clone();
            Ok((
                group.clone(),
                vec![DirectoryEvent::GroupUserDeleted {
                    group,
                    user: username.to_string(),
                }],
            ))
        })
    }

    pub fn add_group_permission(&self, group_name: &str, permission: &str) -> Result<Group, DirectoryError> {
        self.mutate(|state| {
            let group = group_mut(state, group_name)?;
            if !group.add_permission(permission) {
                return Err(DirectoryError::Conflict(format!(
                    "Group \"{}\" already has permission \"{}\"",
                    group_name, permission
                )));
            }
            let group = group.clone();
            Ok((
                group.clone(),
                vec![DirectoryEvent::GroupPermissionAdded {
                    group,
                    permission: permission.to_string(),
                }],
            ))
        })
    }

    pub fn delete_group_permission(&self, group_name: &str, permission: &str) -> Result<Group, DirectoryError> {
        self.mutate(|state| {
            let group = group_mut(state, group_name)?;
            if !group.delete_permission(permission) {
                return Err(DirectoryError::NotFound(format!(
                    "Group \"{}\" has no permission \"{}\"",
                    group_name, permission
                )));
            }
            let group = group.clone();
            Ok((
                group.clone(),
                vec![DirectoryEvent::GroupPermissionDeleted {
                    group,
                    permission: permission.to_string(),
                }],
            ))
        })
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}
