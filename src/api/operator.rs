use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::config::OperatorEntry;
use crate::error::ConsoleError;
use crate::gateway::{ApiRequest, Gateway};

#[derive(Deserialize)]
#[serde(untagged)]
enum OperatorUrlBody {
    Wrapped { url: String },
    Bare(String),
}

/// Entry point of the external IVTS system for OPERATOR users.
#[derive(Clone)]
pub struct OperatorApi {
    gateway: Gateway,
}

impl OperatorApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn entry_url(&self) -> Result<Url, ConsoleError> {
        let config = self.gateway.config();
        let raw = match &config.endpoints.operator_entry {
            OperatorEntry::Redirect(path) => config.url(path),
            OperatorEntry::Lookup(path) => match self.gateway.call_json::<OperatorUrlBody>(ApiRequest::get(path.clone())).await? {
                OperatorUrlBody::Wrapped { url } | OperatorUrlBody::Bare(url) => url,
            },
        };
        debug!(url = %raw, "operator entry resolved");
        Url::parse(raw.trim()).map_err(|e| ConsoleError::Url(format!("{raw}: {e}")))
    }
}
