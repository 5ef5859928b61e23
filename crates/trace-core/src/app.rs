use crate::analysis::{AnalysisRequestor, AnalysisState, DEFAULT_ANALYSIS_DAYS};
use crate::auth::{AuthFlow, LoginForm, RegisterForm};
use crate::burn::{BurnJournal, DEFAULT_BURN_DELAY};
use crate::controller::ChatController;
use crate::error::{CoreError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use trace_client::JournalBackend;
use trace_persist::{CredentialStore, SessionStore};
use trace_types::{Credential, NavAction, Screen, ThreadId, User};

/// Tunables the composition root passes down to each view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub analysis_days: Option<u32>,
    pub burn_delay: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            analysis_days: Some(DEFAULT_ANALYSIS_DAYS),
            burn_delay: DEFAULT_BURN_DELAY,
        }
    }
}

/// Composition root: session, current screen, and the state behind it.
///
/// Each post-auth view owns its state for as long as it is on screen.
/// Leaving a view drops that state, which cancels its requests.
pub struct App<S: CredentialStore> {
    backend: Arc<dyn JournalBackend>,
    sessions: SessionStore<S>,
    auth: AuthFlow,
    settings: AppSettings,
    screen: Screen,
    chat: Option<ChatController>,
    analysis: Option<AnalysisRequestor>,
    burn: Option<BurnJournal>,
    cancel: CancellationToken,
}

impl<S: CredentialStore> App<S> {
    pub fn new(backend: Arc<dyn JournalBackend>, store: S, settings: AppSettings) -> Self {
        Self {
            auth: AuthFlow::new(Arc::clone(&backend)),
            backend,
            sessions: SessionStore::new(store),
            settings,
            screen: Screen::default(),
            chat: None,
            analysis: None,
            burn: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Pick up a stored session. Lands on `Home` when one was found,
    /// otherwise stays on `Start`.
    pub fn start(&mut self) -> Result<Screen> {
        if self.sessions.restore()? {
            self.navigate(NavAction::Authenticated);
        } else {
            self.screen = Screen::Start;
        }
        Ok(self.screen)
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn user(&self) -> Option<&User> {
        self.sessions.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.sessions.is_authenticated()
    }

    /// Apply a navigation action and release the state of any view left
    /// behind
    pub fn navigate(&mut self, action: NavAction) -> Screen {
        let next = self.screen.apply(action, self.is_authenticated());
        if next != self.screen {
            tracing::debug!("Screen {:?} -> {:?}", self.screen, next);
            self.leave(self.screen);
            self.screen = next;
        }
        self.screen
    }

    pub async fn login(&mut self, form: &LoginForm) -> Result<&User> {
        let (user, credential) = self.auth.login(form).await?;
        self.sessions.login(user, credential)?;
        self.navigate(NavAction::Authenticated);
        self.sessions.user().ok_or(CoreError::NotAuthenticated)
    }

    pub async fn register(&mut self, form: &RegisterForm) -> Result<&User> {
        let (user, credential) = self.auth.register(form).await?;
        self.sessions.register(user, credential)?;
        self.navigate(NavAction::Authenticated);
        self.sessions.user().ok_or(CoreError::NotAuthenticated)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.sessions.logout()?;
        self.navigate(NavAction::LoggedOut);
        Ok(())
    }

    /// Show the chat view: list sessions, select the first, load its history
    pub async fn open_chat(&mut self) -> Result<&ChatController> {
        let credential = self.credential()?;
        self.enter(NavAction::OpenChat, Screen::Chat)?;

        let controller = ChatController::with_cancellation(
            Arc::clone(&self.backend),
            credential,
            self.cancel.child_token(),
        );
        let selected = controller.initialize().await;
        controller.ensure_messages_loaded(selected).await?;

        let chat = self.chat.insert(controller);
        Ok(&*chat)
    }

    pub fn chat(&self) -> Option<&ChatController> {
        self.chat.as_ref()
    }

    /// Select a thread in the chat view and load its history if needed
    pub async fn open_thread(&self, id: ThreadId) -> Result<()> {
        let chat = self.chat.as_ref().ok_or(CoreError::Navigation {
            from: self.screen,
            target: Screen::Chat,
        })?;
        chat.select_thread(id)?;
        chat.ensure_messages_loaded(id).await?;
        Ok(())
    }

    /// Show the analysis view and run a first fetch
    pub async fn open_analysis(&mut self) -> Result<AnalysisState> {
        self.enter(NavAction::OpenAnalysis, Screen::Analysis)?;

        let requestor =
            AnalysisRequestor::new(Arc::clone(&self.backend), self.sessions.credential().cloned())
                .with_days(self.settings.analysis_days)
                .with_cancellation(self.cancel.child_token());
        let requestor = self.analysis.insert(requestor);
        Ok(requestor.fetch().await)
    }

    pub fn analysis(&self) -> Option<&AnalysisRequestor> {
        self.analysis.as_ref()
    }

    pub fn open_burn(&mut self) -> Result<&BurnJournal> {
        self.enter(NavAction::OpenBurn, Screen::Burn)?;
        let journal = self
            .burn
            .insert(BurnJournal::with_delay(self.settings.burn_delay));
        Ok(&*journal)
    }

    pub fn burn(&self) -> Option<&BurnJournal> {
        self.burn.as_ref()
    }

    /// Cancel everything in flight across all views
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.chat = None;
        self.analysis = None;
        self.burn = None;
    }

    fn credential(&self) -> Result<Credential> {
        self.sessions
            .credential()
            .cloned()
            .ok_or(CoreError::NotAuthenticated)
    }

    /// Move to a post-auth view, passing through `Home` when another view
    /// is showing
    fn enter(&mut self, action: NavAction, target: Screen) -> Result<()> {
        if !self.is_authenticated() {
            return Err(CoreError::NotAuthenticated);
        }
        if self.screen != Screen::Home && self.screen != target {
            self.navigate(NavAction::BackToHome);
        }
        // Re-entering the same view starts it afresh
        self.leave(target);
        let from = self.screen;
        if self.navigate(action) != target {
            return Err(CoreError::Navigation { from, target });
        }
        Ok(())
    }

    fn leave(&mut self, screen: Screen) {
        match screen {
            Screen::Chat => self.chat = None,
            Screen::Analysis => self.analysis = None,
            Screen::Burn => self.burn = None,
            _ => {}
        }
    }
}

impl<S: CredentialStore> Drop for App<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
