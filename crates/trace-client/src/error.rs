use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// No response arrived (connect, timeout, reset, aborted)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend error {status}: {body}")]
    Status {
        status: StatusCode,
        body: String,
        /// `detail` field of a JSON error body, when present
        detail: Option<String>,
    },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Credential cannot be sent as a header")]
    InvalidCredential,

    #[error("Client configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Build a status error from a raw response body
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let detail = extract_detail(&body);
        ClientError::Status {
            status,
            body,
            detail,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Text fit for showing to the user: the backend's `detail` when it sent
    /// one, a network notice when nothing came back, otherwise `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
            _ => self.detail().unwrap_or(fallback).to_string(),
        }
    }
}

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
