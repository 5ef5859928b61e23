#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};
use trace_client::{
    AnalysisClient, AnalysisResponse, AuthClient, AuthResponse, ChatRequest, ChatResponse,
    ChatSessionClient, ClientError, CreatedSession, DeleteResponse, HistoryEntry,
    JournalBackend, LoginRequest, RegisterRequest, Result, SessionSummary, StatusCode,
};
use trace_types::{Credential, User};

pub const TOKEN: &str = "tok-123";

/// Scripted backend that records every call it receives
#[derive(Default)]
pub struct FakeBackend {
    sessions: Option<Vec<SessionSummary>>,
    histories: HashMap<String, Vec<HistoryEntry>>,
    created_session: Option<String>,
    chat_reply: Option<String>,
    deletable: HashSet<String>,
    analysis: Option<AnalysisResponse>,
    analysis_failure: Option<(StatusCode, String)>,
    analysis_stalled: bool,
    auth_user: Option<User>,
    auth_failure: Option<(StatusCode, String)>,
    calls: Mutex<Vec<String>>,
    chat_requests: Mutex<Vec<ChatRequest>>,
    chat_gate: Mutex<Option<oneshot::Receiver<()>>>,
    chat_started: Notify,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(mut self, sessions: Vec<SessionSummary>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn with_history(mut self, session_id: &str, entries: Vec<HistoryEntry>) -> Self {
        self.histories.insert(session_id.to_string(), entries);
        self
    }

    pub fn with_created_session(mut self, session_id: &str) -> Self {
        self.created_session = Some(session_id.to_string());
        self
    }

    pub fn with_chat_reply(mut self, reply: &str) -> Self {
        self.chat_reply = Some(reply.to_string());
        self
    }

    pub fn with_deletable(mut self, session_id: &str) -> Self {
        self.deletable.insert(session_id.to_string());
        self
    }

    pub fn with_analysis(mut self, response: AnalysisResponse) -> Self {
        self.analysis = Some(response);
        self
    }

    pub fn with_analysis_failure(mut self, status: StatusCode, body: &str) -> Self {
        self.analysis_failure = Some((status, body.to_string()));
        self
    }

    /// Analysis requests never get an answer
    pub fn with_stalled_analysis(mut self) -> Self {
        self.analysis_stalled = true;
        self
    }

    pub fn with_auth_user(mut self, user: User) -> Self {
        self.auth_user = Some(user);
        self
    }

    pub fn with_auth_failure(mut self, status: StatusCode, body: &str) -> Self {
        self.auth_failure = Some((status, body.to_string()));
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Hold the next chat request until the returned sender fires
    pub fn hold_next_chat(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.chat_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Resolves once a chat request has reached the backend
    pub async fn chat_started(&self) {
        self.chat_started.notified().await;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn check(&self, credential: &Credential) -> Result<()> {
        if credential.expose() == TOKEN {
            Ok(())
        } else {
            Err(ClientError::from_status(
                StatusCode::UNAUTHORIZED,
                r#"{"detail":"Could not validate credentials"}"#.to_string(),
            ))
        }
    }

    fn auth_response(&self) -> Result<AuthResponse> {
        if let Some((status, body)) = &self.auth_failure {
            return Err(ClientError::from_status(*status, body.clone()));
        }
        Ok(AuthResponse {
            access_token: TOKEN.to_string(),
            token_type: Some("bearer".to_string()),
            user: self
                .auth_user
                .clone()
                .unwrap_or_else(|| User::new(1, "jane").with_full_name("Jane Doe")),
        })
    }
}

fn server_error() -> ClientError {
    ClientError::from_status(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error".to_string(),
    )
}

pub fn summary(session_id: &str, title: &str) -> SessionSummary {
    SessionSummary {
        session_id: session_id.to_string(),
        title: title.to_string(),
        created_at: None,
        updated_at: None,
        message_count: None,
    }
}

pub fn analysis_response(entry_count: u32, insights: &str) -> AnalysisResponse {
    AnalysisResponse {
        success: true,
        entry_count,
        analysis_period_days: 30,
        timestamp: "2024-05-01T12:00:00".to_string(),
        insights: insights.to_string(),
        message: None,
    }
}

pub fn credential() -> Credential {
    Credential::new(TOKEN)
}

#[async_trait]
impl AuthClient for FakeBackend {
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        self.record(format!("login {}", request.username));
        self.auth_response()
    }

    async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        self.record(format!("register {}", request.username));
        self.auth_response()
    }
}

#[async_trait]
impl ChatSessionClient for FakeBackend {
    async fn create_session(&self, credential: &Credential) -> Result<CreatedSession> {
        self.record("create_session");
        self.check(credential)?;
        match &self.created_session {
            Some(session_id) => Ok(CreatedSession {
                session_id: session_id.clone(),
                created_at: None,
            }),
            None => Err(server_error()),
        }
    }

    async fn list_sessions(&self, credential: &Credential) -> Result<Vec<SessionSummary>> {
        self.record("list_sessions");
        self.check(credential)?;
        self.sessions.clone().ok_or_else(server_error)
    }

    async fn chat_history(
        &self,
        credential: &Credential,
        session_id: &str,
    ) -> Result<Vec<HistoryEntry>> {
        self.record(format!("chat_history {}", session_id));
        self.check(credential)?;
        self.histories.get(session_id).cloned().ok_or_else(server_error)
    }

    async fn delete_session(
        &self,
        credential: &Credential,
        session_id: &str,
    ) -> Result<DeleteResponse> {
        self.record(format!("delete_session {}", session_id));
        self.check(credential)?;
        if self.deletable.contains(session_id) {
            Ok(DeleteResponse::default())
        } else {
            Err(ClientError::from_status(
                StatusCode::NOT_FOUND,
                r#"{"detail":"Session not found"}"#.to_string(),
            ))
        }
    }

    async fn chat(&self, credential: &Credential, request: ChatRequest) -> Result<ChatResponse> {
        self.record(format!("chat {}", request.session_id));
        self.check(credential)?;
        self.chat_requests.lock().unwrap().push(request.clone());

        let gate = self.chat_gate.lock().unwrap().take();
        self.chat_started.notify_one();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        match &self.chat_reply {
            Some(reply) => Ok(ChatResponse {
                response: reply.clone(),
                session_id: Some(request.session_id),
            }),
            None => Err(server_error()),
        }
    }
}

#[async_trait]
impl AnalysisClient for FakeBackend {
    async fn analysis(&self, credential: &Credential, days: Option<u32>) -> Result<AnalysisResponse> {
        self.record(format!("analysis {:?}", days));
        self.check(credential)?;
        if self.analysis_stalled {
            std::future::pending::<()>().await;
        }
        if let Some((status, body)) = &self.analysis_failure {
            return Err(ClientError::from_status(*status, body.clone()));
        }
        self.analysis.clone().ok_or_else(server_error)
    }
}

impl JournalBackend for FakeBackend {}
