use parking_lot::Mutex;

use super::{CredentialStore, StoredCookie, StoredState};
use crate::error::ConsoleError;
use crate::models::{Session, SessionPatch};

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoredState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            state: Mutex::new(StoredState {
                session,
                ..StoredState::default()
            }),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self) -> Session {
        self.state.lock().session.clone()
    }

    fn set(&self, patch: SessionPatch) -> Result<(), ConsoleError> {
        patch.apply(&mut self.state.lock().session);
        Ok(())
    }

    fn clear(&self) -> Result<(), ConsoleError> {
        self.state.lock().session = Session::default();
        Ok(())
    }

    fn remembered_username(&self) -> Option<String> {
        self.state.lock().remembered_username.clone()
    }

    fn remember_username(&self, username: Option<&str>) -> Result<(), ConsoleError> {
        self.state.lock().remembered_username = username.map(str::to_string);
        Ok(())
    }

    fn cookies(&self) -> Vec<StoredCookie> {
        self.state.lock().cookies.clone()
    }

    fn save_cookies(&self, cookies: Vec<StoredCookie>) -> Result<(), ConsoleError> {
        self.state.lock().cookies = cookies;
        Ok(())
    }
}
