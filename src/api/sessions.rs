use crate::error::ConsoleError;
use crate::gateway::{ApiRequest, Gateway};
use crate::models::{SessionQuery, SessionRecord};

/// Login/logout history.
#[derive(Clone)]
pub struct SessionsApi {
    gateway: Gateway,
}

impl SessionsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Failures are surfaced like any other call; an empty history is `Ok(vec![])`.
    pub async fn list(&self, query: &SessionQuery) -> Result<Vec<SessionRecord>, ConsoleError> {
        query.validate_range()?;
        let path = self.gateway.config().endpoints.sessions.clone();
        self.gateway.call_json(ApiRequest::get(path).query(query)?).await
    }
}
