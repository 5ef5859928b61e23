// reqwest implementation of the journaling backend

use crate::config::BackendConfig;
use crate::error::{ClientError, Result};
use crate::traits::{AnalysisClient, AuthClient, ChatSessionClient, JournalBackend};
use crate::types::{
    AnalysisResponse, AuthResponse, ChatRequest, ChatResponse, CreatedSession, DeleteResponse,
    HistoryEntry, HistoryResponse, LoginRequest, RegisterRequest, SessionSummary,
    SessionsResponse,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use trace_types::Credential;

/// HTTP client for the journaling backend (JSON bodies, bearer auth)
#[derive(Clone)]
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for `base_url` with no request timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(BackendConfig::new(base_url))
    }

    pub fn from_config(config: BackendConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.normalized_base_url(),
        })
    }

    pub fn builder() -> HttpBackendBuilder {
        HttpBackendBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client.request(method, self.url(path))
    }

    fn authorized(
        &self,
        method: Method,
        path: &str,
        credential: &Credential,
    ) -> Result<RequestBuilder> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
            .map_err(|_| ClientError::InvalidCredential)?;
        value.set_sensitive(true);
        Ok(self.request(method, path).header(AUTHORIZATION, value))
    }

    /// Send and decode, turning non-success statuses into `ClientError::Status`
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("Backend request failed: status={}, body={}", status, body);
            return Err(ClientError::from_status(status, body));
        }

        tracing::debug!("Backend request successful: {}", status);
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AuthClient for HttpBackend {
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        tracing::debug!("POST /api/auth/login as {}", request.username);
        let builder = self.request(Method::POST, "/api/auth/login").json(&request);
        self.execute(builder).await
    }

    async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        tracing::debug!("POST /api/auth/register as {}", request.username);
        let builder = self.request(Method::POST, "/api/auth/register").json(&request);
        self.execute(builder).await
    }
}

#[async_trait]
impl ChatSessionClient for HttpBackend {
    async fn create_session(&self, credential: &Credential) -> Result<CreatedSession> {
        tracing::debug!("POST /api/chat-sessions/create");
        let builder = self.authorized(Method::POST, "/api/chat-sessions/create", credential)?;
        self.execute(builder).await
    }

    async fn list_sessions(&self, credential: &Credential) -> Result<Vec<SessionSummary>> {
        tracing::debug!("GET /api/chat-sessions");
        let builder = self.authorized(Method::GET, "/api/chat-sessions", credential)?;
        let response: SessionsResponse = self.execute(builder).await?;
        Ok(response.sessions)
    }

    async fn chat_history(
        &self,
        credential: &Credential,
        session_id: &str,
    ) -> Result<Vec<HistoryEntry>> {
        tracing::debug!("GET /api/chat-history/{}", session_id);
        let path = format!("/api/chat-history/{}", session_id);
        let builder = self.authorized(Method::GET, &path, credential)?;
        let response: HistoryResponse = self.execute(builder).await?;
        Ok(response.messages)
    }

    async fn delete_session(
        &self,
        credential: &Credential,
        session_id: &str,
    ) -> Result<DeleteResponse> {
        tracing::debug!("DELETE /api/chat-sessions/{}", session_id);
        let path = format!("/api/chat-sessions/{}", session_id);
        let builder = self.authorized(Method::DELETE, &path, credential)?;
        self.execute(builder).await
    }

    async fn chat(&self, credential: &Credential, request: ChatRequest) -> Result<ChatResponse> {
        tracing::debug!("POST /chat for session {}", request.session_id);
        let builder = self
            .authorized(Method::POST, "/chat", credential)?
            .json(&request);
        self.execute(builder).await
    }
}

#[async_trait]
impl AnalysisClient for HttpBackend {
    async fn analysis(
        &self,
        credential: &Credential,
        days: Option<u32>,
    ) -> Result<AnalysisResponse> {
        tracing::debug!("GET /api/analysis (days={:?})", days);
        let mut builder = self.authorized(Method::GET, "/api/analysis", credential)?;
        if let Some(days) = days {
            builder = builder.query(&[("days", days)]);
        }
        self.execute(builder).await
    }
}

impl JournalBackend for HttpBackend {}

/// Builder for `HttpBackend`
pub struct HttpBackendBuilder {
    config: BackendConfig,
}

impl HttpBackendBuilder {
    pub fn new() -> Self {
        Self {
            config: BackendConfig::default(),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpBackend> {
        if self.config.normalized_base_url().is_empty() {
            return Err(ClientError::Config("base_url is required".to_string()));
        }
        HttpBackend::from_config(self.config)
    }
}

impl Default for HttpBackendBuilder {
    fn default() -> Self {
        Self::new()
    }
}
