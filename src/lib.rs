use std::sync::Arc;

use tracing::info;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod models;
pub mod result;
pub mod store;
pub mod utils;

use api::{OperatorApi, SessionsApi, UsersApi};
use auth::Authenticator;
use config::Config;
use error::ConsoleError;
use gateway::Gateway;
use guard::{Navigation, RouteGuard, Screen};
use models::Session;
use store::{CredentialStore, FileStore, MemoryStore, PersistentCookieJar};

/// The wired-up console: one store, one authenticator and one gateway
/// shared by every API client.
#[derive(Clone)]
pub struct Console {
    pub config: Arc<Config>,
    pub store: Arc<dyn CredentialStore>,
    pub auth: Authenticator,
    pub gateway: Gateway,
    pub users: UsersApi,
    pub sessions: SessionsApi,
    pub operator: OperatorApi,
    pub guard: RouteGuard,
}

impl Console {
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self, ConsoleError> {
        let config = Arc::new(config);
        // The refresh credential is an HTTP-only cookie set by the login response.
        let jar = Arc::new(PersistentCookieJar::new(store.clone()));
        let http = reqwest::Client::builder()
            .cookie_provider(jar)
            .timeout(config.request_timeout())
            .build()?;

        let auth = Authenticator::new(http.clone(), config.clone(), store.clone());
        let gateway = Gateway::new(http, config.clone(), store.clone(), auth.clone());
        let operator = OperatorApi::new(gateway.clone());

        Ok(Self {
            users: UsersApi::new(gateway.clone()),
            sessions: SessionsApi::new(gateway.clone()),
            guard: RouteGuard::new(store.clone(), operator.clone()),
            operator,
            gateway,
            auth,
            store,
            config,
        })
    }

    /// Uses a file-backed store when `CREDENTIAL_STORE_PATH` is configured.
    pub fn from_config(config: Config) -> Result<Self, ConsoleError> {
        let store: Arc<dyn CredentialStore> = match &config.credential_store_path {
            Some(path) => {
                info!(path = %path.display(), "using file credential store");
                Arc::new(FileStore::open(path.clone())?)
            }
            None => Arc::new(MemoryStore::new()),
        };
        Self::new(config, store)
    }

    /// Validates a stored session before the first screen is shown.
    pub async fn restore(&self) -> Result<Session, ConsoleError> {
        self.auth.restore().await
    }

    /// Logs in and returns where the user lands.
    pub async fn login(&self, username: &str, password: &str, remember_me: bool) -> Result<Navigation, ConsoleError> {
        self.auth.login(username, password, remember_me).await?;
        self.guard.enter(Screen::Dashboard).await
    }

    pub async fn logout(&self) -> Result<Navigation, ConsoleError> {
        self.auth.logout().await?;
        Ok(Navigation::Redirect(Screen::Login))
    }
}
