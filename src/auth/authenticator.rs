use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::StatusCode;
use tracing::{debug, error, info, warn};

use super::models::{LoginOutcome, LoginRequest, LoginResponse, RefreshTokenResponse};
use crate::config::{Config, RefreshMethod};
use crate::error::ConsoleError;
use crate::models::{Session, SessionPatch};
use crate::result::ErrorBody;
use crate::store::CredentialStore;
use crate::utils::needs_renewal;

#[derive(Debug, Clone)]
struct RefreshFailure(String);

type SharedRefresh = Shared<BoxFuture<'static, Result<String, RefreshFailure>>>;

/// Everything a refresh needs, cheap to clone into the shared future.
#[derive(Clone)]
struct RefreshContext {
    http: reqwest::Client,
    config: Arc<Config>,
    store: Arc<dyn CredentialStore>,
    /// Bumped whenever a session starts or ends, so a refresh that finishes
    /// after a logout cannot bring the old session back. Held while the
    /// store is written.
    epoch: Arc<Mutex<u64>>,
}

/// Login, logout and silent refresh against the backend's auth endpoints.
#[derive(Clone)]
pub struct Authenticator {
    ctx: RefreshContext,
    inflight: Arc<Mutex<Option<(u64, SharedRefresh)>>>,
    refresh_seq: Arc<AtomicU64>,
}

impl Authenticator {
    pub fn new(http: reqwest::Client, config: Arc<Config>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            ctx: RefreshContext {
                http,
                config,
                store,
                epoch: Arc::new(Mutex::new(0)),
            },
            inflight: Arc::new(Mutex::new(None)),
            refresh_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.ctx.store
    }

    /// Exchanges credentials for an access token and stores the new session.
    /// Rejected credentials leave the store untouched.
    pub async fn login(&self, username: &str, password: &str, remember_me: bool) -> Result<LoginOutcome, ConsoleError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ConsoleError::Validation("Please enter your username!".to_string()));
        }
        if password.is_empty() {
            return Err(ConsoleError::Validation("Please enter your password!".to_string()));
        }

        let ctx = &self.ctx;
        let response = ctx
            .http
            .post(ctx.config.url(&ctx.config.endpoints.login))
            .json(&LoginRequest {
                username,
                password,
                remember_me,
            })
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = ErrorBody::parse(&bytes).message_or("Invalid credentials");
            warn!(username, status = status.as_u16(), "login rejected");
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                    ConsoleError::InvalidCredentials(message)
                }
                _ => ConsoleError::from_status(status, message),
            });
        }

        let body: LoginResponse = serde_json::from_slice(&bytes)?;

        {
            let mut epoch = ctx.epoch.lock();
            *epoch += 1;
            ctx.store.set(SessionPatch {
                access_token: Some(body.access_token.clone()),
                role: Some(body.role),
                remember_me: Some(remember_me),
            })?;
            ctx.store.remember_username(remember_me.then_some(username))?;
        }

        info!(username, role = %body.role, remember_me, "login succeeded");
        Ok(LoginOutcome {
            access_token: body.access_token,
            role: body.role,
        })
    }

    /// Mints a new access token from the server-side session cookie.
    ///
    /// At most one refresh is in flight: concurrent callers await the same
    /// request and see the same outcome. A failed refresh ends the session.
    pub async fn refresh(&self) -> Result<String, ConsoleError> {
        let (id, shared) = {
            let mut slot = self.inflight.lock();
            match slot.as_ref() {
                Some((id, shared)) => (*id, shared.clone()),
                None => {
                    let id = self.refresh_seq.fetch_add(1, Ordering::SeqCst);
                    let ctx = self.ctx.clone();
                    let shared = async move { ctx.refresh_once().await }.boxed().shared();
                    *slot = Some((id, shared.clone()));
                    (id, shared)
                }
            }
        };

        let outcome = shared.await;

        {
            let mut slot = self.inflight.lock();
            if slot.as_ref().is_some_and(|(current, _)| *current == id) {
                *slot = None;
            }
        }

        outcome.map_err(|RefreshFailure(reason)| {
            debug!(reason = %reason, "refresh failed");
            ConsoleError::SessionExpired
        })
    }

    /// Ends the session. The server call is best effort; the local session is
    /// cleared whatever happens to it.
    pub async fn logout(&self) -> Result<(), ConsoleError> {
        let ctx = &self.ctx;
        let session = ctx.store.get();
        *ctx.epoch.lock() += 1;

        let mut request = ctx.http.post(ctx.config.url(&ctx.config.endpoints.logout));
        if let Some(token) = session.access_token.as_deref() {
            request = request.bearer_auth(token);
        }
        match request.send().await {
            Ok(response) if response.status().is_success() => info!("logged out"),
            Ok(response) => warn!(status = response.status().as_u16(), "server rejected logout, clearing local session anyway"),
            Err(e) => warn!(error = %e, "logout request failed, clearing local session anyway"),
        }

        let _epoch = ctx.epoch.lock();
        ctx.end_session(&session)
    }

    /// Checks a stored session before first use. A JWT that has expired, or
    /// is inside the renewal window, is refreshed up front; if that fails
    /// the store is left empty.
    pub async fn restore(&self) -> Result<Session, ConsoleError> {
        let session = self.ctx.store.get();
        let Some(token) = session.access_token.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(session);
        };

        let leeway = self.ctx.config.proactive_refresh_leeway().unwrap_or_default();
        if needs_renewal(token, leeway, Utc::now()) {
            info!("stored access token is expiring, refreshing");
            match self.refresh().await {
                Ok(_) => {}
                Err(e) if e.is_auth_terminal() => info!("stored session could not be renewed"),
                Err(e) => return Err(e),
            }
        }
        Ok(self.ctx.store.get())
    }
}

impl RefreshContext {
    async fn refresh_once(self) -> Result<String, RefreshFailure> {
        let started = *self.epoch.lock();
        let url = self.config.url(&self.config.endpoints.refresh);
        let request = match self.config.endpoints.refresh_method {
            RefreshMethod::Get => self.http.get(url),
            RefreshMethod::Post => self.http.post(url),
        };

        let outcome = match request.send().await {
            Ok(response) if response.status().is_success() => match response.json::<RefreshTokenResponse>().await {
                Ok(body) if !body.access_token.is_empty() => Ok(body.access_token),
                Ok(_) => Err(RefreshFailure("empty access token".to_string())),
                Err(e) => Err(RefreshFailure(format!("unreadable refresh response: {e}"))),
            },
            Ok(response) => Err(RefreshFailure(format!("refresh rejected with HTTP {}", response.status()))),
            Err(e) => Err(RefreshFailure(format!("refresh request failed: {e}"))),
        };

        match outcome {
            Ok(token) => {
                let epoch = self.epoch.lock();
                if *epoch != started {
                    return Err(RefreshFailure("session ended while refreshing".to_string()));
                }
                self.store
                    .set(SessionPatch::token(token.clone()))
                    .map_err(|e| RefreshFailure(format!("failed to store refreshed token: {e}")))?;
                info!("access token refreshed");
                Ok(token)
            }
            Err(failure) => {
                warn!(reason = %failure.0, "refresh token expired, logging out");
                let mut epoch = self.epoch.lock();
                if *epoch == started {
                    *epoch += 1;
                    let session = self.store.get();
                    if let Err(e) = self.end_session(&session) {
                        error!(error = %e, "failed to clear session after refresh failure");
                    }
                }
                Err(failure)
            }
        }
    }

    fn end_session(&self, session: &Session) -> Result<(), ConsoleError> {
        let cleared = self.store.clear();
        if !session.remember_me {
            self.store.remember_username(None)?;
        }
        cleared
    }
}
