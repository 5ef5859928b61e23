use crate::error::Result;
use crate::types::{
    AnalysisResponse, AuthResponse, ChatRequest, ChatResponse, CreatedSession, DeleteResponse,
    HistoryEntry, LoginRequest, RegisterRequest, SessionSummary,
};
use async_trait::async_trait;
use trace_types::Credential;

/// Unauthenticated endpoints that exchange credentials for a bearer token
#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse>;

    async fn register(&self, request: RegisterRequest) -> Result<AuthResponse>;
}

/// Chat session management and message completion
///
/// Every call carries the bearer credential of the signed-in user.
#[async_trait]
pub trait ChatSessionClient: Send + Sync {
    /// Open a new remote session; the backend stores a greeting with it
    async fn create_session(&self, credential: &Credential) -> Result<CreatedSession>;

    /// Sessions of the current user, in backend order
    async fn list_sessions(&self, credential: &Credential) -> Result<Vec<SessionSummary>>;

    /// Stored exchanges of one session, oldest first
    async fn chat_history(
        &self,
        credential: &Credential,
        session_id: &str,
    ) -> Result<Vec<HistoryEntry>>;

    async fn delete_session(
        &self,
        credential: &Credential,
        session_id: &str,
    ) -> Result<DeleteResponse>;

    async fn chat(&self, credential: &Credential, request: ChatRequest) -> Result<ChatResponse>;
}

/// Narrative analysis over recent entries
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// `days` narrows the window; `None` uses the backend default
    async fn analysis(&self, credential: &Credential, days: Option<u32>)
        -> Result<AnalysisResponse>;
}

/// Convenience trait for backends that serve every endpoint
pub trait JournalBackend: AuthClient + ChatSessionClient + AnalysisClient {}
