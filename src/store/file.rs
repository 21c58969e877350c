use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use super::{CredentialStore, StoredCookie, StoredState};
use crate::error::ConsoleError;
use crate::models::{Session, SessionPatch};

/// JSON file store. The session survives restarts, which is what a page
/// reload is to the browser console.
///
/// The file is plaintext: anyone who can read it can use the access token.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: Mutex<StoredState>,
}

impl FileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConsoleError> {
        let path = path.into();
        let state = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => StoredState::default(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| ConsoleError::Storage {
                message: format!("{} is not a valid credential file: {e}", path.display()),
                source: None,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => StoredState::default(),
            Err(e) => return Err(ConsoleError::storage(format!("failed to read {}", path.display()), e)),
        };
        debug!(path = %path.display(), authenticated = state.session.is_authenticated(), "credential store opened");

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to a copy, persists it, then publishes it. A failed
    /// write leaves both the file and the in-memory state untouched.
    fn update(&self, change: impl FnOnce(&mut StoredState)) -> Result<(), ConsoleError> {
        let mut state = self.state.lock();
        let mut next = state.clone();
        change(&mut next);
        self.persist(&next)?;
        *state = next;
        Ok(())
    }

    fn persist(&self, state: &StoredState) -> Result<(), ConsoleError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConsoleError::storage(format!("failed to create {}", parent.display()), e))?;
        }
        let json = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| ConsoleError::storage(format!("failed to write {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| ConsoleError::storage(format!("failed to replace {}", self.path.display()), e))
    }
}

impl CredentialStore for FileStore {
    fn get(&self) -> Session {
        self.state.lock().session.clone()
    }

    fn set(&self, patch: SessionPatch) -> Result<(), ConsoleError> {
        self.update(|state| patch.apply(&mut state.session))
    }

    /// The session is dropped from memory even when the file cannot be rewritten.
    fn clear(&self) -> Result<(), ConsoleError> {
        let mut state = self.state.lock();
        state.session = Session::default();
        self.persist(&state)
    }

    fn remembered_username(&self) -> Option<String> {
        self.state.lock().remembered_username.clone()
    }

    fn remember_username(&self, username: Option<&str>) -> Result<(), ConsoleError> {
        let username = username.map(str::to_string);
        self.update(|state| state.remembered_username = username)
    }

    fn cookies(&self) -> Vec<StoredCookie> {
        self.state.lock().cookies.clone()
    }

    fn save_cookies(&self, cookies: Vec<StoredCookie>) -> Result<(), ConsoleError> {
        self.update(|state| state.cookies = cookies)
    }
}
