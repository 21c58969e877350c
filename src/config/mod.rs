use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConsoleError;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUTH_FAILURE_STATUSES: [u16; 2] = [401, 403];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMethod {
    Get,
    Post,
}

/// How an OPERATOR reaches the external IVTS system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorEntry {
    /// `GET <path>` answers `{ "url": ... }`.
    Lookup(String),
    /// Full-page navigation to `<base><path>`; the backend redirects.
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub login: String,
    pub refresh: String,
    pub refresh_method: RefreshMethod,
    pub logout: String,
    pub users: String,
    pub sessions: String,
    pub operator_entry: OperatorEntry,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            refresh: "/auth/refresh-token".to_string(),
            refresh_method: RefreshMethod::Get,
            logout: "/auth/logout".to_string(),
            users: "/users".to_string(),
            sessions: "/sessions".to_string(),
            operator_entry: OperatorEntry::Lookup("/getIvtsOperatorUrl".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub credential_store_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub auth_failure_statuses: Vec<u16>,
    pub proactive_refresh_leeway_secs: Option<u64>,
    pub endpoints: Endpoints,
}

impl Config {
    /// Configuration with defaults for everything but the backend address.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            credential_store_path: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            auth_failure_statuses: DEFAULT_AUTH_FAILURE_STATUSES.to_vec(),
            proactive_refresh_leeway_secs: None,
            endpoints: Endpoints::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConsoleError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConsoleError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_base = lookup("API_BASE_URL").ok_or_else(|| ConsoleError::Config("API_BASE_URL is not set".to_string()))?;
        let host = lookup("API_HOST").unwrap_or_else(|| "localhost".to_string());

        let mut config = Config::new(raw_base.replace("{host}", &host).trim_end_matches('/'));

        config.credential_store_path = lookup("CREDENTIAL_STORE_PATH").filter(|p| !p.trim().is_empty()).map(PathBuf::from);

        if let Some(raw) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number(&raw, "REQUEST_TIMEOUT_SECS")?;
        }
        if let Some(raw) = lookup("AUTH_FAILURE_STATUSES") {
            config.auth_failure_statuses = parse_statuses(&raw)?;
        }
        if let Some(raw) = lookup("PROACTIVE_REFRESH_LEEWAY_SECS") {
            config.proactive_refresh_leeway_secs = Some(parse_number(&raw, "PROACTIVE_REFRESH_LEEWAY_SECS")?);
        }

        let endpoints = &mut config.endpoints;
        if let Some(path) = lookup("AUTH_LOGIN_PATH") {
            endpoints.login = path;
        }
        if let Some(path) = lookup("AUTH_REFRESH_PATH") {
            endpoints.refresh = path;
        }
        if let Some(method) = lookup("AUTH_REFRESH_METHOD") {
            endpoints.refresh_method = match method.trim().to_ascii_uppercase().as_str() {
                "GET" => RefreshMethod::Get,
                "POST" => RefreshMethod::Post,
                other => return Err(ConsoleError::Config(format!("AUTH_REFRESH_METHOD must be GET or POST, got {other}"))),
            };
        }
        if let Some(path) = lookup("AUTH_LOGOUT_PATH") {
            endpoints.logout = path;
        }
        if let Some(path) = lookup("USERS_PATH") {
            endpoints.users = path;
        }
        if let Some(path) = lookup("SESSIONS_PATH") {
            endpoints.sessions = path;
        }
        if let Some(path) = lookup("OPERATOR_REDIRECT_PATH") {
            endpoints.operator_entry = OperatorEntry::Redirect(path);
        } else if let Some(path) = lookup("OPERATOR_URL_PATH") {
            endpoints.operator_entry = OperatorEntry::Lookup(path);
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn proactive_refresh_leeway(&self) -> Option<Duration> {
        self.proactive_refresh_leeway_secs.map(Duration::from_secs)
    }

    /// Absolute URL of a backend path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

fn parse_number(raw: &str, key: &str) -> Result<u64, ConsoleError> {
    raw.trim()
        .trim_end_matches('s')
        .parse::<u64>()
        .map_err(|_| ConsoleError::Config(format!("{key} must be a number of seconds, got {raw:?}")))
}

fn parse_statuses(raw: &str) -> Result<Vec<u16>, ConsoleError> {
    let statuses = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>()
                .ok()
                .filter(|code| (400..500).contains(code))
                .ok_or_else(|| ConsoleError::Config(format!("AUTH_FAILURE_STATUSES contains an invalid status {s:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if statuses.is_empty() {
        return Err(ConsoleError::Config("AUTH_FAILURE_STATUSES must list at least one status".to_string()));
    }
    Ok(statuses)
}
