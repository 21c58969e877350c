//! Authenticated request gateway.
//!
//! Every protected backend call goes through [`Gateway::call`], which owns the
//! one predicate deciding what counts as an authorization failure and the one
//! refresh-then-retry cycle that follows it.

mod request;

pub use request::{ApiRequest, ApiResponse};

use std::sync::Arc;

use chrono::Utc;
use reqwest::StatusCode;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::auth::Authenticator;
use crate::config::Config;
use crate::error::ConsoleError;
use crate::result::ErrorBody;
use crate::store::CredentialStore;
use crate::utils::needs_renewal;

#[derive(Clone)]
pub struct Gateway {
    http: reqwest::Client,
    config: Arc<Config>,
    store: Arc<dyn CredentialStore>,
    auth: Authenticator,
    auth_failures: Arc<[StatusCode]>,
}

impl Gateway {
    pub fn new(http: reqwest::Client, config: Arc<Config>, store: Arc<dyn CredentialStore>, auth: Authenticator) -> Self {
        let auth_failures = config
            .auth_failure_statuses
            .iter()
            .filter_map(|code| StatusCode::from_u16(*code).ok())
            .collect();
        Self {
            http,
            config,
            store,
            auth,
            auth_failures,
        }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The single authorization-failure predicate. Callers never inspect
    /// status codes for this themselves.
    pub fn is_authorization_failure(&self, status: StatusCode) -> bool {
        self.auth_failures.contains(&status)
    }

    /// Sends `request` with the current access token.
    ///
    /// On an authorization failure the token is refreshed (or taken over from
    /// a refresh another call already did) and the request is re-issued
    /// exactly once. A failed refresh yields `SessionExpired`; a retry that is
    /// still unauthorized logs out and yields `AuthorizationDenied`. Any other
    /// failure is returned as is and leaves the session alone.
    pub async fn call(&self, request: ApiRequest) -> Result<ApiResponse, ConsoleError> {
        let request_id = Uuid::new_v4();
        let token = self.current_token().await?;

        let response = self.send(&request, token.as_deref(), request_id).await?;
        if !self.is_authorization_failure(response.status) {
            return finish(response);
        }

        warn!(
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
            status = response.status.as_u16(),
            "authorization failure, refreshing access token"
        );
        let fresh = self.token_after_failure(token.as_deref()).await?;

        let retried = self.send(&request, Some(&fresh), request_id).await?;
        if self.is_authorization_failure(retried.status) {
            warn!(
                request_id = %request_id,
                path = %request.path,
                status = retried.status.as_u16(),
                "request still unauthorized after refresh, logging out"
            );
            if let Err(e) = self.auth.logout().await {
                error!(error = %e, "failed to clear session");
            }
            return Err(ConsoleError::AuthorizationDenied);
        }
        finish(retried)
    }

    /// [`call`](Self::call) and decode a JSON body.
    pub async fn call_json<T: serde::de::DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ConsoleError> {
        self.call(request).await?.json()
    }

    async fn current_token(&self) -> Result<Option<String>, ConsoleError> {
        let token = self.store.get().access_token.filter(|t| !t.is_empty());
        if let (Some(current), Some(leeway)) = (token.as_deref(), self.config.proactive_refresh_leeway()) {
            if needs_renewal(current, leeway, Utc::now()) {
                debug!("access token inside renewal window, refreshing before sending");
                return self.auth.refresh().await.map(Some);
            }
        }
        Ok(token)
    }

    /// The token to retry with after `stale` was rejected. If another call
    /// already replaced it, that token is reused instead of refreshing again;
    /// if another call already ended the session, so does this one.
    async fn token_after_failure(&self, stale: Option<&str>) -> Result<String, ConsoleError> {
        match self.store.get().access_token.filter(|t| !t.is_empty()) {
            Some(current) if Some(current.as_str()) != stale => {
                debug!("access token already replaced, retrying with it");
                Ok(current)
            }
            None if stale.is_some() => Err(ConsoleError::SessionExpired),
            _ => self.auth.refresh().await,
        }
    }

    async fn send(&self, request: &ApiRequest, token: Option<&str>, request_id: Uuid) -> Result<ApiResponse, ConsoleError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.config.url(&request.path))
            .header("X-Request-Id", request_id.to_string());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        debug!(
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            "request completed"
        );
        Ok(ApiResponse { status, body })
    }
}

fn finish(response: ApiResponse) -> Result<ApiResponse, ConsoleError> {
    if response.status.is_success() {
        return Ok(response);
    }
    let fallback = response.status.canonical_reason().unwrap_or("Request failed");
    let message = ErrorBody::parse(&response.body).message_or(fallback);
    Err(ConsoleError::from_status(response.status, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn gateway(statuses: Vec<u16>) -> Gateway {
        let mut config = Config::new("http://127.0.0.1:9");
        config.auth_failure_statuses = statuses;
        let config = Arc::new(config);
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        let http = reqwest::Client::new();
        let auth = Authenticator::new(http.clone(), config.clone(), store.clone());
        Gateway::new(http, config, store, auth)
    }

    #[test]
    fn predicate_follows_configuration() {
        let both = gateway(vec![401, 403]);
        assert!(both.is_authorization_failure(StatusCode::UNAUTHORIZED));
        assert!(both.is_authorization_failure(StatusCode::FORBIDDEN));
        assert!(!both.is_authorization_failure(StatusCode::NOT_FOUND));

        let only_401 = gateway(vec![401]);
        assert!(!only_401.is_authorization_failure(StatusCode::FORBIDDEN));
    }

    #[test]
    fn finish_keeps_server_message() {
        let response = ApiResponse {
            status: StatusCode::CONFLICT,
            body: br#"{"error":"Username already exists"}"#.to_vec(),
        };
        match finish(response) {
            Err(ConsoleError::Validation(message)) => assert_eq!(message, "Username already exists"),
            other => panic!("unexpected: {other:?}"),
        }

        let response = ApiResponse {
            status: StatusCode::BAD_GATEWAY,
            body: Vec::new(),
        };
        match finish(response) {
            Err(ConsoleError::Api { status, message }) => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
