//! Error types shared across the client.
//!
//! `ApiError` covers everything that can go wrong talking to the backend,
//! `AuthError` the login flow on top of it. Both carry a `user_message()`
//! with the canned text shown in notifications; `Display` stays technical
//! and is what ends up in the log file.

use std::collections::BTreeMap;

use thiserror::Error;

/// Field name -> first failing validation message.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("<no message>"))]
    Status { status: u16, message: Option<String> },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        Self::Status { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Text for the notification area.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(msg) if msg.contains("timed out") => {
                "The request timed out. Please try again.".to_string()
            }
            Self::Network(_) => {
                "Connection error. Check that the backend is running and reachable.".to_string()
            }
            Self::Status { status, message } => status_message(*status, message.as_deref()),
            Self::Decode(_) => "Unexpected response from the server.".to_string(),
            Self::Unexpected(msg) => friendly_message(msg),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status { status: status.as_u16(), message: None }
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Map an HTTP status to the fixed message per code class.
pub fn status_message(status: u16, body_message: Option<&str>) -> String {
    match status {
        401 => "Unauthorized. Your session has expired.".to_string(),
        403 => "Unauthorized. You do not have permission for this action.".to_string(),
        404 => "Resource not found.".to_string(),
        422 => "Invalid data. Check the information entered.".to_string(),
        s if s >= 500 => "Server error. Please try again later.".to_string(),
        s => body_message
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP error {s}")),
    }
}

/// Best-effort translation of a raw failure text into something a user can act on.
///
/// Used by the global handler for failures that never went through
/// [`ApiError::user_message`], e.g. a panicked background task.
pub fn friendly_message(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if lower.contains("fetch") || lower.contains("network") || lower.contains("connect") {
        "Connection error. Check your network and that the backend is running.".to_string()
    } else if raw.contains("CORS") {
        "Server configuration error. Contact the administrator.".to_string()
    } else if raw.contains("401") || raw.contains("403") {
        "Session expired. Please log in again.".to_string()
    } else if lower.contains("timeout") || lower.contains("timed out") {
        "The operation timed out. Please try again.".to_string()
    } else {
        "An unexpected error occurred. Please try again.".to_string()
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("Please enter username and password")]
    MissingCredentials,

    #[error("Username must be at least 3 characters")]
    UsernameTooShort,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Cannot connect to the server. Make sure the backend is running.")]
    Unreachable,

    #[error("Invalid credentials. Check your username and password.")]
    InvalidCredentials,

    #[error("Authentication service not found. Contact the administrator.")]
    ServiceNotFound,

    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("could not persist session: {0}")]
    Storage(String),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
