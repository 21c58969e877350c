use tracing::info;
use validator::Validate;

use crate::error::ConsoleError;
use crate::gateway::{ApiRequest, Gateway};
use crate::models::{NewUser, PasswordReset, User, UserUpdate};

/// User management. Payloads are validated before anything is sent.
#[derive(Clone)]
pub struct UsersApi {
    gateway: Gateway,
}

impl UsersApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    fn collection(&self) -> String {
        self.gateway.config().endpoints.users.clone()
    }

    fn member(&self, id: i64) -> String {
        format!("{}/{}", self.collection().trim_end_matches('/'), id)
    }

    pub async fn list(&self) -> Result<Vec<User>, ConsoleError> {
        self.gateway.call_json(ApiRequest::get(self.collection())).await
    }

    pub async fn create(&self, user: &NewUser) -> Result<(), ConsoleError> {
        user.validate()?;
        self.gateway.call(ApiRequest::post(self.collection()).json(user)?).await?;
        info!(username = %user.username, role = %user.role, "user created");
        Ok(())
    }

    pub async fn update(&self, id: i64, user: &UserUpdate) -> Result<(), ConsoleError> {
        user.validate()?;
        self.gateway.call(ApiRequest::put(self.member(id)).json(user)?).await?;
        info!(id, username = %user.username, "user updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), ConsoleError> {
        self.gateway.call(ApiRequest::delete(self.member(id))).await?;
        info!(id, "user deleted");
        Ok(())
    }

    pub async fn reset_password(&self, id: i64, reset: &PasswordReset) -> Result<(), ConsoleError> {
        reset.validate()?;
        let path = format!("{}/reset-password", self.member(id));
        self.gateway.call(ApiRequest::post(path).json(reset)?).await?;
        info!(id, "password reset");
        Ok(())
    }
}
