//! Authorization roles.
//!
//! Roles are stored and serialized by their authority string
//! (`ROLE_CLIENT`, `ROLE_ADMIN`). A user holds a [`RoleSet`]; a user can be a
//! client, an admin, or both.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Error returned when an authority string does not name a known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// A single authorization role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// A customer placing and viewing their own orders.
    #[serde(rename = "ROLE_CLIENT")]
    Client,
    /// Store staff with access to every order and catalog writes.
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    /// The authority string stored in the database.
    #[must_use]
    pub const fn authority(self) -> &'static str {
        match self {
            Self::Client => "ROLE_CLIENT",
            Self::Admin => "ROLE_ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.authority())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    /// Accepts the authority string or the bare role name, case-insensitively
    /// (`ROLE_ADMIN`, `admin`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.strip_prefix("ROLE_").unwrap_or(&upper) {
            "CLIENT" => Ok(Self::Client),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

/// The set of roles held by a user.
///
/// Serializes as a sorted list of authority strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// An empty role set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Add a role. Returns `false` if it was already present.
    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    /// Whether the set holds `role`.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Whether the set holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.contains(Role::Admin)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the roles in authority order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str_accepts_authority_and_bare_name() {
        assert_eq!("ROLE_ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("client".parse::<Role>().unwrap(), Role::Client);
        assert_eq!(" Admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("ROLE_OPERATOR".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_display_is_authority() {
        assert_eq!(Role::Client.to_string(), "ROLE_CLIENT");
        assert_eq!(Role::Admin.to_string(), "ROLE_ADMIN");
    }

    #[test]
    fn test_role_set_membership() {
        let mut roles = RoleSet::new();
        assert!(roles.is_empty());
        assert!(roles.insert(Role::Client));
        assert!(!roles.insert(Role::Client));
        assert!(roles.contains(Role::Client));
        assert!(!roles.is_admin());

        roles.insert(Role::Admin);
        assert!(roles.is_admin());
        assert_eq!(roles.iter().collect::<Vec<_>>(), vec![Role::Client, Role::Admin]);
    }

    #[test]
    fn test_role_set_serializes_as_authorities() {
        let roles = RoleSet::from([Role::Admin, Role::Client]);
        let json = serde_json::to_string(&roles).unwrap();
        assert_eq!(json, r#"["ROLE_CLIENT","ROLE_ADMIN"]"#);
    }
}
