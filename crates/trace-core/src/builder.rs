use crate::app::{App, AppSettings};
use crate::error::{CoreError, Result};
use std::sync::Arc;
use std::time::Duration;
use trace_client::{BackendConfig, HttpBackend, JournalBackend};
use trace_persist::CredentialStore;

/// Builder for constructing an App with its collaborators
pub struct AppBuilder<S: CredentialStore> {
    backend: Option<Arc<dyn JournalBackend>>,
    backend_config: Option<BackendConfig>,
    store: Option<S>,
    settings: AppSettings,
}

impl<S: CredentialStore> AppBuilder<S> {
    pub fn new() -> Self {
        Self {
            backend: None,
            backend_config: None,
            store: None,
            settings: AppSettings::default(),
        }
    }

    /// Use an existing backend implementation
    pub fn backend(mut self, backend: Arc<dyn JournalBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Build an HTTP backend from configuration (ignored when `backend` is set)
    pub fn backend_config(mut self, config: BackendConfig) -> Self {
        self.backend_config = Some(config);
        self
    }

    /// Durable storage for the signed-in session
    pub fn store(mut self, store: S) -> Self {
        self.store = Some(store);
        self
    }

    pub fn settings(mut self, settings: AppSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn analysis_days(mut self, days: Option<u32>) -> Self {
        self.settings.analysis_days = days;
        self
    }

    pub fn burn_delay(mut self, delay: Duration) -> Self {
        self.settings.burn_delay = delay;
        self
    }

    pub fn build(self) -> Result<App<S>> {
        let store = self
            .store
            .ok_or_else(|| CoreError::Config("Credential store is required".to_string()))?;

        let backend: Arc<dyn JournalBackend> = match (self.backend, self.backend_config) {
            (Some(backend), _) => backend,
            (None, Some(config)) => Arc::new(HttpBackend::from_config(config)?),
            (None, None) => {
                return Err(CoreError::Config(
                    "Backend or backend configuration is required".to_string(),
                ))
            }
        };

        Ok(App::new(backend, store, self.settings))
    }
}

impl<S: CredentialStore> Default for AppBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
