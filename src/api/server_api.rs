use std::fmt;

use async_trait::async_trait;

use super::types::{FrameworkInfo, ServerRecord, UserOptions};

/// Errors that can occur while talking to the launcher API.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Client misconfigured (bad base URL, unusable token).
    Config(String),
    /// Network-level failure (DNS, connection refused, reset).
    Network(String),
    /// The request did not complete within the configured timeout.
    Timeout,
    /// API returned a non-success status.
    Api { status: u16, message: String },
    /// Failed to parse the response body.
    Parse(String),
    /// The call ended without producing a result.
    Interrupted,
}

impl ApiError {
    /// The text shown to the user. All kinds fold into one string.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Config(msg) | ApiError::Network(msg) | ApiError::Parse(msg) => msg.clone(),
            ApiError::Timeout => "request timed out".to_string(),
            ApiError::Interrupted => "request was interrupted".to_string(),
            ApiError::Api { message, .. } => message.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Config(msg) => write!(f, "config error: {msg}"),
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Timeout => write!(f, "request timed out"),
            ApiError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ApiError::Parse(msg) => write!(f, "parse error: {msg}"),
            ApiError::Interrupted => write!(f, "request was interrupted"),
        }
    }
}

impl std::error::Error for ApiError {}

/// The server operations the launcher needs.
///
/// Implementations are expected to apply their own retry policy, so callers
/// only ever see the final outcome.
#[async_trait]
pub trait ServerApi: Send + Sync {
    /// `POST /server/{id}`
    async fn start_server(&self, id: &str) -> Result<(), ApiError>;

    /// `DELETE /server/{id}?remove={remove}`. `remove = false` stops the
    /// server and keeps its definition; `remove = true` deletes it.
    async fn remove_server(&self, id: &str, remove: bool) -> Result<(), ApiError>;

    /// `GET /server/`, managed apps only, sorted by id.
    async fn list_servers(&self) -> Result<Vec<ServerRecord>, ApiError>;

    /// `GET /server/{id}`
    async fn get_server(&self, id: &str) -> Result<ServerRecord, ApiError>;

    /// `GET /frameworks`
    async fn list_frameworks(&self) -> Result<Vec<FrameworkInfo>, ApiError>;

    /// `POST /server/{id}` with `{"user_options": ...}`, creating a new app.
    async fn create_server(&self, id: &str, options: &UserOptions) -> Result<(), ApiError>;
}
