use serde::{Deserialize, Serialize};

use crate::models::Role;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub remember_me: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    #[serde(alias = "access_token", alias = "token")]
    pub access_token: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshTokenResponse {
    #[serde(alias = "access_token", alias = "token")]
    pub access_token: String,
}

/// Result of a successful login. An OPERATOR login is a success too; the
/// route guard sends it to the external system.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub access_token: String,
    pub role: Role,
}

impl std::fmt::Debug for LoginOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginOutcome").field("role", &self.role).finish_non_exhaustive()
    }
}
