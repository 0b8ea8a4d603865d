//! Permission strings are `<namespace>:<action>`. A stored `<namespace>:*`
//! grants every action in the namespace.

/// Wildcard form covering every action in the namespace of `permission`
pub fn wildcard_for(permission: &str) -> String {
    let namespace = permission.split(':').next().unwrap_or_default();
    format!("{}:*", namespace)
}

/// Check a granted set for `permission`, exactly or through its wildcard
pub fn grants(granted: &[String], permission: &str) -> bool {
    if granted.iter().any(|p| p == permission) {
        return true;
    }

    let wildcard = wildcard_for(permission);
    granted.iter().any(|p| *p == wildcard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_match() {
        assert!(grants(&set(&["calendar:create"]), "calendar:create"));
        assert!(!grants(&set(&["calendar:create"]), "calendar:delete"));
    }

    #[test]
    fn test_wildcard_covers_namespace() {
        let granted = set(&["calendar:*"]);
        assert!(grants(&granted, "calendar:create"));
        assert!(grants(&granted, "calendar:delete"));
        assert!(!grants(&granted, "reminders:create"));
    }

    #[test]
    fn test_permission_without_namespace() {
        assert_eq!(wildcard_for("google-search"), "google-search:*");
        assert!(grants(&set(&["google-search"]), "google-search"));
        assert!(grants(&set(&["google-search:*"]), "google-search"));
    }
}
