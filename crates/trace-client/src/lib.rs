pub mod config;
pub mod error;
pub mod http;
pub mod traits;
pub mod types;

pub use config::BackendConfig;
pub use error::{ClientError, Result, NETWORK_ERROR_MESSAGE};
pub use http::{HttpBackend, HttpBackendBuilder};
pub use traits::{AnalysisClient, AuthClient, ChatSessionClient, JournalBackend};
pub use reqwest::StatusCode;
pub use types::{
    AnalysisResponse, AuthResponse, ChatRequest, ChatResponse, CreatedSession, DeleteResponse,
    HistoryEntry, HistoryResponse, LoginRequest, RegisterRequest, SessionSummary,
    SessionsResponse,
};
