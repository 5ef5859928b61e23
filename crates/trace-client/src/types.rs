//! Wire types for the backend's JSON endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trace_types::{AnalysisResult, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedSession {
    pub session_id: String,
    #[serde(default, deserialize_with = "trace_types::timestamp::deserialize_lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "trace_types::timestamp::deserialize_lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "trace_types::timestamp::deserialize_lenient")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionsResponse {
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,
}

/// One stored exchange: what the user wrote and what the assistant answered.
/// Session creation stores an entry with an empty `user_message`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub ai_response: String,
    #[serde(default, deserialize_with = "trace_types::timestamp::deserialize_lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    pub fn new(user_message: impl Into<String>, ai_response: impl Into<String>) -> Self {
        Self {
            id: None,
            user_message: user_message.into(),
            ai_response: ai_response.into(),
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub deleted_entries: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub entry_count: u32,
    #[serde(default)]
    pub analysis_period_days: u32,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub insights: String,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl From<AnalysisResponse> for AnalysisResult {
    fn from(response: AnalysisResponse) -> Self {
        Self {
            entry_count: response.entry_count,
            analysis_period_days: response.analysis_period_days,
            timestamp: response.timestamp,
            insights: response.insights,
        }
    }
}
