//! Relationship-to-permission mapping and action normalization.
//!
//! The mapping is fixed at engine construction and has no mutation API;
//! per-deployment overrides are a documented extension point, not a core
//! feature.
use std::collections::HashMap;

pub(crate) const PERMISSION_ADMIN: &str = "admin";
pub(crate) const PERMISSION_READ: &str = "read";
pub(crate) const PERMISSION_READ_LIMITED: &str = "read_limited";

/// Default relationship-to-permission mappings.
///
/// `inherit` grants no concrete permission by itself; it marks the
/// relationship as a conduit for group and hierarchical traversal.
pub(crate) fn default_permission_map() -> HashMap<String, Vec<String>> {
    let mut map = HashMap::new();
    let mut insert = |relationship: &str, permissions: &[&str]| {
        map.insert(
            relationship.to_string(),
            permissions.iter().map(|p| p.to_string()).collect(),
        );
    };
    insert("owner", &["read", "write", "delete", "admin"]);
    insert("editor", &["read", "write", "edit"]);
    insert("viewer", &["read", "view"]);
    insert("member", &["inherit"]);
    insert("group_access", &["read", "write"]);
    insert("parent", &["inherit"]);
    insert("friend", &["read_limited"]);
    insert("manager", &["read", "write", "delete", "manage"]);
    map
}

/// Maps request actions onto the canonical permission vocabulary.
/// Unrecognized actions pass through unchanged, so normalization is
/// idempotent.
pub fn normalize_action(action: &str) -> &str {
    match action {
        "view" => "read",
        "edit" | "update" | "modify" => "write",
        "remove" => "delete",
        "manage" | "administer" => "admin",
        other => other,
    }
}

/// Whether a permission list grants `permission`. `admin` dominates: a
/// list containing it grants every concrete permission.
pub(crate) fn grants(permissions: &[String], permission: &str) -> bool {
    permissions
        .iter()
        .any(|candidate| candidate == permission || candidate == PERMISSION_ADMIN)
}
