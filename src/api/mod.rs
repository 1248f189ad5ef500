//! HTTP client for the clinic backend.
//!
//! Wraps a [`reqwest::Client`] with the base URL and the bearer token of
//! the current session. All calls return [`ApiError`]; non-2xx responses
//! carry the `{message}` from the error body when there is one. Entity
//! endpoints live in [`resources`].

pub mod resources;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;

pub use resources::LoginResponse;

/// Cheap to clone: clones share the connection pool and the token.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// * `base_url` - e.g. `http://localhost:8080/api`; a trailing `/` is dropped.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Unexpected(format!("building HTTP client: {e}")))?;
        Ok(Self::with_client(http, base_url))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.send(Method::PUT, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, path, None).await.map(|_| ())
    }

    /// Issue one request. An empty success body (204, or 200 with no
    /// content) yields `Value::Null`.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        let mut req = self.http.request(method.clone(), self.url(path));
        if let Some(token) = self.token() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        debug!(%method, path, "request");
        let response = match req.send().await {
            Ok(r) => r,
            Err(err) => {
                let err = ApiError::from(err);
                warn!(%method, path, %err, "request failed");
                return Err(err);
            }
        };
        let result = Self::parse_response(response).await;
        if let Err(err) = &result {
            warn!(%method, path, %err, "backend returned an error");
        }
        result
    }

    async fn parse_response(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), error_message(&text)));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// `message` (or `error`) from a JSON error body; plain-text bodies are
/// used as they are.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(v) => ["message", "error"]
            .iter()
            .find_map(|k| v.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        Err(_) => Some(body.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_message_field() {
        assert_eq!(error_message(r#"{"message":"Cedula taken","error":"x"}"#).as_deref(), Some("Cedula taken"));
        assert_eq!(error_message(r#"{"error":"Bad Request"}"#).as_deref(), Some("Bad Request"));
        assert_eq!(error_message(r#"{"status":400}"#), None);
        assert_eq!(error_message("  "), None);
        assert_eq!(error_message("gateway down").as_deref(), Some("gateway down"));
    }

    #[test]
    fn base_url_is_normalized_and_token_shared() {
        let api = ApiClient::new("http://localhost:8080/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.url("/patients"), "http://localhost:8080/api/patients");
        let clone = api.clone();
        api.set_token(Some("abc".into()));
        assert_eq!(clone.token().as_deref(), Some("abc"));
        clone.set_token(None);
        assert!(api.token().is_none());
    }
}
