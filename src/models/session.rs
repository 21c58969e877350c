use std::fmt;

use serde::{Deserialize, Serialize};

use super::Role;

/// Client-side authentication state owned by the credential store.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub remember_me: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self == &Session::default()
    }
}

// Tokens never reach the logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

/// Partial update merged into the stored session; `None` fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub access_token: Option<String>,
    pub role: Option<Role>,
    pub remember_me: Option<bool>,
}

impl SessionPatch {
    pub fn token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Self::default()
        }
    }

    pub fn apply(self, session: &mut Session) {
        if let Some(token) = self.access_token {
            session.access_token = Some(token);
        }
        if let Some(role) = self.role {
            session.role = Some(role);
        }
        if let Some(remember_me) = self.remember_me {
            session.remember_me = remember_me;
        }
    }
}
