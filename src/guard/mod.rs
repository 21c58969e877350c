//! Route guard: decides where a navigation ends up from the stored session.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info};

use crate::api::OperatorApi;
use crate::error::ConsoleError;
use crate::models::Role;
use crate::store::CredentialStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    Users,
    Sessions,
}

impl Screen {
    pub fn is_protected(self) -> bool {
        !matches!(self, Screen::Login)
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('/').to_ascii_lowercase().as_str() {
            "" | "login" => Ok(Screen::Login),
            "dashboard" => Ok(Screen::Dashboard),
            "users" => Ok(Screen::Users),
            "sessions" => Ok(Screen::Sessions),
            other => Err(format!("unknown screen {other:?}")),
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Login => "login",
            Screen::Dashboard => "dashboard",
            Screen::Users => "users",
            Screen::Sessions => "sessions",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Screen),
    Redirect(Screen),
    /// Full-page navigation away from the console.
    External(Url),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated { role: Role },
}

#[derive(Clone)]
pub struct RouteGuard {
    store: Arc<dyn CredentialStore>,
    operator: OperatorApi,
}

impl RouteGuard {
    pub fn new(store: Arc<dyn CredentialStore>, operator: OperatorApi) -> Self {
        Self { store, operator }
    }

    /// A token without a role is treated as no session at all.
    pub fn state(&self) -> AuthState {
        let session = self.store.get();
        match (session.is_authenticated(), session.role) {
            (true, Some(role)) => AuthState::Authenticated { role },
            _ => AuthState::Unauthenticated,
        }
    }

    /// Username to prefill on the login screen.
    pub fn login_prefill(&self) -> Option<String> {
        self.store.remembered_username()
    }

    pub async fn enter(&self, screen: Screen) -> Result<Navigation, ConsoleError> {
        let state = self.state();
        debug!(%screen, ?state, "entering screen");

        let navigation = match (state, screen.is_protected()) {
            (AuthState::Unauthenticated, true) => Navigation::Redirect(Screen::Login),
            (AuthState::Unauthenticated, false) => Navigation::Render(Screen::Login),
            (AuthState::Authenticated { role: Role::Operator }, _) => self.operator_entry().await?,
            (AuthState::Authenticated { role: Role::Admin }, true) => Navigation::Render(screen),
            (AuthState::Authenticated { role: Role::Admin }, false) => Navigation::Redirect(Screen::Dashboard),
        };
        Ok(navigation)
    }

    async fn operator_entry(&self) -> Result<Navigation, ConsoleError> {
        match self.operator.entry_url().await {
            Ok(url) => {
                info!(url = %url, "redirecting operator to IVTS");
                Ok(Navigation::External(url))
            }
            Err(e) if e.is_auth_terminal() => Ok(Navigation::Redirect(Screen::Login)),
            Err(e) => Err(e),
        }
    }
}
