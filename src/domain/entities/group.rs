use serde::{Deserialize, Serialize};

use super::permission;

/// A named set of users sharing permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    /// Member user names
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            users: Vec::new(),
            permissions: Vec::new(),
        }
    }

    pub fn with_user(mut self, username: impl Into<String>) -> Self {
        self.add_user(username);
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.add_permission(permission);
        self
    }

    pub fn has_user(&self, username: &str) -> bool {
        self.users.iter().any(|u| u == username)
    }

    pub fn add_user(&mut self, username: impl Into<String>) -> bool {
        let username = username.into();
        if self.has_user(&username) {
            return false;
        }
        self.users.push(username);
        true
    }

    pub fn delete_user(&mut self, username: &str) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u != username);
        self.users.len() != before
    }

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let mut group = Group::new("admins");
        assert!(group.add_user("alex"));
        assert!(!group.add_user("alex"));
        assert!(group.has_user("alex"));
        assert!(group.delete_user("alex"));
        assert!(!group.has_user("alex"));
    }

    #[test]
    fn test_group_wildcard() {
        let group = Group::new("admins").with_permission("admin:*");
        assert!(group.has_permission("admin:restart"));
        assert!(!group.has_permission("calendar:create"));
    }
}
