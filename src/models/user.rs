use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Role;

/// Application user as listed by the backend. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub role: Role,
}

/// Create-user payload.
#[derive(Clone, Serialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "Please enter the name"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid username"))]
    pub username: String,
    #[validate(length(min = 1, message = "Please enter the password"))]
    pub password: String,
    #[serde(serialize_with = "Role::serialize_label")]
    pub role: Role,
}

/// Edit-user payload. Passwords change only through [`PasswordReset`].
#[derive(Debug, Clone, Serialize, Validate)]
pub struct UserUpdate {
    #[validate(length(min = 1, message = "Please enter the name"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid username"))]
    pub username: String,
    #[serde(serialize_with = "Role::serialize_label")]
    pub role: Role,
}

/// Reset-password payload; only `password` goes on the wire.
#[derive(Clone, Serialize, Validate)]
pub struct PasswordReset {
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[serde(skip_serializing)]
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirmation: String,
}

impl PasswordReset {
    pub fn new(password: impl Into<String>, confirmation: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            confirmation: confirmation.into(),
        }
    }
}

impl From<&User> for UserUpdate {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl fmt::Debug for PasswordReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordReset").finish_non_exhaustive()
    }
}
