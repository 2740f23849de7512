// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! Roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Roles for authorization.
///
/// - `Admin` - may view all orders, change order statuses, and adjust quotas
/// - `Member` - may only act on their own basket and orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Normal community member
    Member,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            (Role::Admin, _) => true,
            (Role::Member, Role::Member) => true,
            _ => false,
        }
    }

    /// Parse role from string (case-insensitive). Used when reading the
    /// role table.
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Default role is Member (least privilege for authenticated users).
    fn default() -> Self {
        Role::Member
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Member => write!(f, "member"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_all_privileges() {
        assert!(Role::Admin.has_privilege(Role::Admin));
        assert!(Role::Admin.has_privilege(Role::Member));
    }

    #[test]
    fn member_only_has_member_privilege() {
        assert!(!Role::Member.has_privilege(Role::Admin));
        assert!(Role::Member.has_privilege(Role::Member));
    }

    #[test]
    fn from_str_parses_correctly() {
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_str("Member"), Some(Role::Member));
        assert_eq!(Role::from_str("unknown"), None);
    }

    #[test]
    fn default_role_is_member() {
        assert_eq!(Role::default(), Role::Member);
    }
}
