//! Burn journal: free text that is written and then thrown away.
//!
//! Nothing here touches storage or the network. Burning starts a short
//! transition after which the text is gone for good.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_BURN_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BurnState {
    #[default]
    Idle,
    Burning,
}

#[derive(Debug, Default)]
struct Journal {
    input: String,
    state: BurnState,
}

pub struct BurnJournal {
    journal: Arc<Mutex<Journal>>,
    delay: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl Default for BurnJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl BurnJournal {
    pub fn new() -> Self {
        Self::with_delay(DEFAULT_BURN_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            journal: Arc::new(Mutex::new(Journal::default())),
            delay,
            timer: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    pub fn input(&self) -> String {
        lock(&self.journal).input.clone()
    }

    pub fn state(&self) -> BurnState {
        lock(&self.journal).state
    }

    pub fn is_burning(&self) -> bool {
        self.state() == BurnState::Burning
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the text. Ignored while burning; returns whether it applied.
    pub fn set_input(&self, text: impl Into<String>) -> bool {
        let mut journal = lock(&self.journal);
        if journal.state == BurnState::Burning {
            return false;
        }
        journal.input = text.into();
        true
    }

    /// Start burning the current text. Blank text or a burn already running
    /// leaves everything as is. Must be called inside a Tokio runtime.
    pub fn burn(&self) -> bool {
        {
            let mut journal = lock(&self.journal);
            if journal.input.trim().is_empty() || journal.state == BurnState::Burning {
                return false;
            }
            journal.state = BurnState::Burning;
        }

        let deadline = Instant::now() + self.delay;
        let journal = Arc::clone(&self.journal);
        let cancel = self.cancel.child_token();

        tracing::debug!("Burning journal entry");
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    let mut journal = lock(&journal);
                    journal.input.clear();
                    journal.state = BurnState::Idle;
                    tracing::info!("Journal entry burned");
                }
            }
        });

        *self.timer.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        true
    }

    /// Wait for a running burn to finish
    pub async fn settled(&self) {
        let handle = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("Burn timer failed: {}", e);
            }
        }
    }
}

impl Drop for BurnJournal {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn lock(journal: &Mutex<Journal>) -> MutexGuard<'_, Journal> {
    journal.lock().unwrap_or_else(PoisonError::into_inner)
}
