use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use trace_client::{AnalysisClient, ClientError, JournalBackend};
use trace_types::{AnalysisResult, Credential};

pub const DEFAULT_ANALYSIS_DAYS: u32 = 30;

const MISSING_TOKEN_MESSAGE: &str = "No authentication token found";
const FAILED_MESSAGE: &str = "Failed to generate analysis. Please try again.";

/// What the analysis panel shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisState {
    pub loading: bool,
    pub error: Option<String>,
    pub result: Option<AnalysisResult>,
}

/// Requests the narrative analysis of recent entries.
///
/// Every `fetch` starts over; nothing is cached between calls. A failed fetch
/// leaves the previous result in place next to the error.
pub struct AnalysisRequestor {
    backend: Arc<dyn JournalBackend>,
    credential: Option<Credential>,
    days: Option<u32>,
    state: Mutex<AnalysisState>,
    cancel: CancellationToken,
}

impl AnalysisRequestor {
    pub fn new(backend: Arc<dyn JournalBackend>, credential: Option<Credential>) -> Self {
        Self {
            backend,
            credential,
            days: Some(DEFAULT_ANALYSIS_DAYS),
            state: Mutex::new(AnalysisState::default()),
            cancel: CancellationToken::new(),
        }
    }

    /// Window in days; `None` leaves it to the backend
    pub fn with_days(mut self, days: Option<u32>) -> Self {
        self.days = days;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> AnalysisState {
        self.lock().clone()
    }

    pub async fn fetch(&self) -> AnalysisState {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }

        let pending = Unsettled { requestor: self };
        let outcome = self.request().await;
        pending.disarm();

        let mut state = self.lock();
        match outcome {
            Ok(result) => {
                tracing::info!(
                    "Analysis ready: {} entries over {} days",
                    result.entry_count,
                    result.analysis_period_days
                );
                state.result = Some(result);
            }
            Err(message) => {
                tracing::warn!("Analysis failed: {}", message);
                state.error = Some(message);
            }
        }
        state.loading = false;
        state.clone()
    }

    async fn request(&self) -> std::result::Result<AnalysisResult, String> {
        let credential = self
            .credential
            .as_ref()
            .ok_or_else(|| MISSING_TOKEN_MESSAGE.to_string())?;

        tracing::debug!("Requesting analysis for {:?} days", self.days);
        let response = tokio::select! {
            _ = self.cancel.cancelled() => return Err(FAILED_MESSAGE.to_string()),
            response = self.backend.analysis(credential, self.days) => response,
        };

        match response {
            Ok(response) if response.success => Ok(response.into()),
            Ok(response) => Err(response
                .message
                .unwrap_or_else(|| FAILED_MESSAGE.to_string())),
            Err(ClientError::Status { status, body, .. }) => {
                Err(format!("Error: {} - {}", status.as_u16(), body))
            }
            Err(e) => {
                tracing::error!("Analysis request error: {}", e);
                Err(FAILED_MESSAGE.to_string())
            }
        }
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn lock(&self) -> MutexGuard<'_, AnalysisState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for AnalysisRequestor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Settles a fetch whose future was dropped mid-request, so the panel never
/// stays loading with nothing to show.
struct Unsettled<'a> {
    requestor: &'a AnalysisRequestor,
}

impl Unsettled<'_> {
    fn disarm(self) {
        std::mem::forget(self);
    }
}

impl Drop for Unsettled<'_> {
    fn drop(&mut self) {
        let mut state = self.requestor.lock();
        state.loading = false;
        state.error = Some(FAILED_MESSAGE.to_string());
    }
}
