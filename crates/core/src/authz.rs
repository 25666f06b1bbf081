//! Authenticated principal and ownership checks.
//!
//! The principal is passed explicitly into every workflow that needs it; there
//! is no ambient "current user". The checks here are pure so they can be
//! exercised without a request context.

use serde::{Deserialize, Serialize};

use crate::types::{RoleSet, UserId};

/// The authenticated identity making the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The user this principal was resolved to.
    pub id: UserId,
    /// Roles held at resolution time.
    pub roles: RoleSet,
}

impl Principal {
    #[must_use]
    pub const fn new(id: UserId, roles: RoleSet) -> Self {
        Self { id, roles }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.is_admin()
    }
}

/// The principal is neither the target user nor an admin.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user {principal} may not access resources owned by user {target}")]
pub struct AccessDenied {
    /// The requesting user.
    pub principal: UserId,
    /// The owner of the resource.
    pub target: UserId,
}

/// Owner check: the principal is the target user, or holds the admin role.
#[must_use]
pub fn is_self_or_admin(principal: &Principal, target: UserId) -> bool {
    principal.id == target || principal.is_admin()
}

/// [`is_self_or_admin`] as a `Result`, for `?` propagation.
///
/// # Errors
///
/// Returns [`AccessDenied`] when the principal is not `target` and not an admin.
pub fn ensure_self_or_admin(principal: &Principal, target: UserId) -> Result<(), AccessDenied> {
    if is_self_or_admin(principal, target) {
        Ok(())
    } else {
        Err(AccessDenied {
            principal: principal.id,
            target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn client(id: i64) -> Principal {
        Principal::new(UserId::new(id), RoleSet::from([Role::Client]))
    }

    fn admin(id: i64) -> Principal {
        Principal::new(UserId::new(id), RoleSet::from([Role::Admin]))
    }

    #[test]
    fn test_owner_is_allowed() {
        assert!(is_self_or_admin(&client(1), UserId::new(1)));
    }

    #[test]
    fn test_other_client_is_denied() {
        assert!(!is_self_or_admin(&client(1), UserId::new(2)));
        assert_eq!(
            ensure_self_or_admin(&client(1), UserId::new(2)),
            Err(AccessDenied {
                principal: UserId::new(1),
                target: UserId::new(2),
            })
        );
    }

    #[test]
    fn test_admin_is_allowed_for_any_target() {
        for target in 1..=5 {
            assert!(ensure_self_or_admin(&admin(99), UserId::new(target)).is_ok());
        }
    }

    #[test]
    fn test_principal_with_both_roles_is_admin() {
        let principal = Principal::new(UserId::new(2), RoleSet::from([Role::Client, Role::Admin]));
        assert!(principal.roles.contains(Role::Client));
        assert!(principal.is_admin());
        assert!(is_self_or_admin(&principal, UserId::new(1)));
    }

    #[test]
    fn test_principal_without_roles_only_reaches_itself() {
        let principal = Principal::new(UserId::new(7), RoleSet::new());
        assert!(is_self_or_admin(&principal, UserId::new(7)));
        assert!(!is_self_or_admin(&principal, UserId::new(8)));
    }
}
