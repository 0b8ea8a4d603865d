//! Permission resolver - Decides whether a sender may run a secure action

use std::sync::Arc;

use super::directory::Directory;
use crate::domain::entities::{Group, User};

/// Authorizes identities against the users and groups in a [`Directory`]
pub struct PermissionResolver {
    directory: Arc<Directory>,
}

impl PermissionResolver {
    pub fn new(directory: Arc<Directory>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    /// Non-secure actions are always allowed. Secure actions need a user
    /// owning `identity` that holds `permission` directly or through a group.
    pub fn authorize(&self, identity: &str, permission: &str, secure: bool) -> bool {
        if !secure {
            return true;
        }

        match self
            .directory
            .read(|state| authorize(&state.users, &state.groups, identity, permission))
        {
            Ok(permitted) => permitted,
            Err(e) => {
                tracing::error!("Permission check for {} failed: {}", permission, e);
                false
            }
        }
    }
}

/// Check `permission` for the user owning `identity`
pub fn authorize(users: &[User], groups: &[Group], identity: &str, permission: &str) -> bool {
    let Some(user) = users.iter().find(|u| u.has_identity(identity)) else {
        return false;
    };

    if user.has_permission(permission) {
        return true;
    }

    groups
        .iter()
        .any(|g| g.has_user(&user.name) && g.has_permission(permission))
}
