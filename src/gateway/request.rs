use std::fmt;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ConsoleError;

/// A backend call that can be sent more than once.
#[derive(Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ConsoleError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Adds the fields of `params` as query parameters; `null` fields are skipped.
    pub fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Result<Self, ConsoleError> {
        if let serde_json::Value::Object(fields) = serde_json::to_value(params)? {
            for (key, value) in fields {
                let value = match value {
                    serde_json::Value::Null => continue,
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                self.query.push((key, value));
            }
        }
        Ok(self)
    }
}

// Bodies carry passwords on create and reset.
impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ConsoleError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Filters {
        name: Option<String>,
        page: u32,
        #[serde(rename = "fromDate")]
        from_date: Option<String>,
    }

    #[test]
    fn query_skips_nulls() {
        let request = ApiRequest::get("/sessions")
            .query(&Filters {
                name: Some("jane".into()),
                page: 2,
                from_date: None,
            })
            .unwrap();
        assert_eq!(request.query, vec![("name".to_string(), "jane".to_string()), ("page".to_string(), "2".to_string())]);
    }

    #[test]
    fn debug_hides_the_body() {
        let request = ApiRequest::post("/users/1/reset-password")
            .json(&serde_json::json!({ "password": "s3cret!" }))
            .unwrap();
        let printed = format!("{request:?}");
        assert!(!printed.contains("s3cret!"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("/users/1/reset-password"));
    }

    #[test]
    fn json_body_is_kept_for_retries() {
        let request = ApiRequest::post("/users/1/reset-password")
            .json(&serde_json::json!({ "password": "s3cret!" }))
            .unwrap();
        let copy = request.clone();
        assert_eq!(copy.body, request.body);
        assert_eq!(copy.method, Method::POST);
    }
}
