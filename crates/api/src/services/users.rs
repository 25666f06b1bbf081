//! Profile of the authenticated user.

use dscommerce_core::Principal;

use super::ServiceError;
use crate::db::{Stores, UserStore};
use crate::dto::UserDto;

pub struct UserService<'a> {
    users: &'a dyn UserStore,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub fn new(stores: &'a Stores) -> Self {
        Self {
            users: stores.users.as_ref(),
        }
    }

    /// The principal's own profile.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user was removed after the
    /// token was resolved.
    pub async fn me(&self, principal: &Principal) -> Result<UserDto, ServiceError> {
        let user = self
            .users
            .find_user(principal.id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {} not found", principal.id)))?;

        Ok(UserDto::from(&user))
    }
}
