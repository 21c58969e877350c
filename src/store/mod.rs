//! Credential store: the single owner of the client-side [`Session`].
//!
//! Every component receives the store as an injected `Arc<dyn CredentialStore>`;
//! nothing reads session state from ambient globals.

mod cookies;
mod file;
mod memory;

pub use cookies::PersistentCookieJar;
pub use file::FileStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};

use crate::error::ConsoleError;
use crate::models::{Session, SessionPatch};

pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Session;

    /// Merges `patch` into the stored session and persists the result.
    fn set(&self, patch: SessionPatch) -> Result<(), ConsoleError>;

    /// Removes every session field. The remembered username is kept.
    fn clear(&self) -> Result<(), ConsoleError>;

    fn remembered_username(&self) -> Option<String>;

    /// `None` forgets the username.
    fn remember_username(&self, username: Option<&str>) -> Result<(), ConsoleError>;

    /// Cookies the backend has set, as received. The refresh credential lives here.
    fn cookies(&self) -> Vec<StoredCookie>;

    fn save_cookies(&self, cookies: Vec<StoredCookie>) -> Result<(), ConsoleError>;
}

/// A `Set-Cookie` header and the URL of the response that carried it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub url: String,
    pub raw: String,
}

/// Everything a store persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredState {
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub remembered_username: Option<String>,
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,
}
