//! The authenticated user's profile.

use chrono::NaiveDate;
use serde::Serialize;

use dscommerce_core::{RoleSet, UserId};

use crate::models::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub roles: RoleSet,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.as_str().to_owned(),
            phone: user.phone.clone(),
            birth_date: user.birth_date,
            roles: user.roles.clone(),
        }
    }
}
