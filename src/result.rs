use serde::Deserialize;

/// Error envelope returned by the backend on failed requests.
///
/// Deployments disagree on the field name, so every known spelling is read.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "errorMessage")]
    pub error_message: Option<String>,
}

impl ErrorBody {
    /// Lenient parse: a non-JSON or empty body yields an empty envelope.
    pub fn parse(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }

    pub fn message_or(self, fallback: &str) -> String {
        [self.message, self.error, self.error_message]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}
