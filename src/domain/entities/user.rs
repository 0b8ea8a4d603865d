use serde::{Deserialize, Serialize};
use std::fmt;

use super::permission;

/// A person known to the bot, reachable through one or more identities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub identities: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identities: Vec::new(),
            permissions: Vec::new(),
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.add_identity(identity);
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.add_permission(permission);
        self
    }

    pub fn has_identity(&self, identity: &str) -> bool {
        self.identities.iter().any(|i| i == identity)
    }

    /// Returns false when the identity was already present
    pub fn add_identity(&mut self, identity: impl Into<String>) -> bool {
        let identity = identity.into();
        if self.has_identity(&identity) {
            return false;
        }
        self.identities.push(identity);
        true
    }

    /// Returns false when the identity was not present
    pub fn delete_identity(&mut self, identity: &str) -> bool {
        let before = self.identities.len();
        self.identities.retain(|i| i != identity);
        self.identities.len() != before
    }

    /// Exact or wildcard match
    pub fn has_permission(&self, permission: &str) -> bool {
        permission::grants(&self.permissions, permission)
    }

    pub fn has_exact_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn add_permission(&mut self, permission: impl Into<String>) -> bool {
        let permission = permission.into();
        if self.has_exact_permission(&permission) {
            return false;
        }
        self.permissions.push(permission);
        true
    }

    pub fn delete_permission(&mut self, permission: &str) -> bool {
        let before = self.permissions.len();
        self.permissions.retain(|p| p != permission);
        self.permissions.len() != before
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities_are_a_set() {
        let mut user = User::new("alex");
        assert!(user.add_identity("twitter@_whitman"));
        assert!(!user.add_identity("twitter@_whitman"));
        assert!(user.has_identity("twitter@_whitman"));
        assert!(user.delete_identity("twitter@_whitman"));
        assert!(!user.delete_identity("twitter@_whitman"));
        assert!(user.identities.is_empty());
    }

    #[test]
    fn test_wildcard_permission() {
        let user = User::new("alex").with_permission("calendar:*");
        assert!(user.has_permission("calendar:create"));
        assert!(user.has_permission("calendar:delete"));
        assert!(!user.has_permission("reminders:create"));
        assert!(!user.has_exact_permission("calendar:create"));
    }

    #[test]
    fn test_deserialize_without_collections() {
        let user: User = serde_json::from_str(r#"{"name":"paul"}"#).unwrap();
        assert_eq!(user, User::new("paul"));
    }
}
