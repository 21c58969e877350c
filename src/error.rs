use reqwest::StatusCode;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("Session expired, please login again")]
    SessionExpired,
    #[error("Access denied, please login again")]
    AuthorizationDenied,
    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    Validation(String),
    #[error("Validation error: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("Request failed with HTTP {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("Unexpected response body")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
    #[error("Credential store error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid URL: {0}")]
    Url(String),
}

impl ConsoleError {
    pub fn storage(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Authentication-class errors: the session has been cleared and the
    /// user has to go back through the login screen.
    pub fn is_auth_terminal(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::AuthorizationDenied)
    }

    /// Maps a non-authorization failure response to the error surfaced to
    /// the caller. Payload rejections keep the server's message.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::Validation(message)
            }
            _ => Self::Api { status, message },
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(source: serde_json::Error) -> Self {
        Self::Decode { source }
    }
}

impl From<std::io::Error> for ConsoleError {
    fn from(e: std::io::Error) -> Self {
        ConsoleError::storage("I/O failure", e)
    }
}
