use crate::error::{CoreError, Result};
use crate::exchange::{PendingSend, SendOutcome};
use crate::registry::{history_turns, ChatRegistry};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use trace_client::{ChatRequest, ChatSessionClient, HistoryEntry, JournalBackend};
use trace_types::{
    generate_session_id, ChatThread, Credential, Sender, ThreadId, DEFAULT_GREETING,
};

/// Drives the chat registry against the backend for one signed-in user.
///
/// Registry transitions run under a short lock that is never held across a
/// request. Every request races the controller's cancellation token, which
/// fires on `shutdown` or drop.
pub struct ChatController {
    backend: Arc<dyn JournalBackend>,
    credential: Credential,
    state: Arc<Mutex<ChatRegistry>>,
    cancel: CancellationToken,
}

impl ChatController {
    pub fn new(backend: Arc<dyn JournalBackend>, credential: Credential) -> Self {
        Self::with_cancellation(backend, credential, CancellationToken::new())
    }

    /// Controller whose requests also stop when `cancel` fires
    pub fn with_cancellation(
        backend: Arc<dyn JournalBackend>,
        credential: Credential,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            credential,
            state: Arc::new(Mutex::new(ChatRegistry::new())),
            cancel,
        }
    }

    /// Load the user's sessions, falling back to one local thread when the
    /// listing fails or is empty. Returns the selected thread.
    pub async fn initialize(&self) -> ThreadId {
        tracing::debug!("Listing chat sessions");
        let sessions = match self.guarded(self.backend.list_sessions(&self.credential)).await {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!("Could not list chat sessions, starting fresh: {}", e);
                Vec::new()
            }
        };

        let count = sessions.len();
        let selected = self.registry().install_remote(sessions);
        tracing::info!("Chat initialized with {} remote session(s)", count);
        selected
    }

    /// Open a new thread at the front of the list and select it.
    ///
    /// The backend's greeting becomes the first message. Any failure yields
    /// an empty local thread instead.
    pub async fn create_thread(&self) -> ThreadId {
        match self.create_remote().await {
            Ok((session_id, created_at, entries)) => {
                tracing::info!("Created chat session {}", session_id);
                self.registry().prepend(|id| {
                    let mut thread = ChatThread::new_local(id, session_id);
                    if let Some(created_at) = created_at {
                        thread = thread.with_created_at(created_at);
                    }
                    let turns = history_turns(entries);
                    if turns.is_empty() {
                        thread.push(Sender::Assistant, DEFAULT_GREETING);
                    } else {
                        thread.load_history(turns);
                    }
                    thread
                })
            }
            Err(e) => {
                tracing::warn!("Could not create chat session, using a local thread: {}", e);
                self.registry()
                    .prepend(|id| ChatThread::new_local(id, generate_session_id()))
            }
        }
    }

    async fn create_remote(
        &self,
    ) -> Result<(String, Option<chrono::DateTime<chrono::Utc>>, Vec<HistoryEntry>)> {
        tracing::debug!("Creating chat session");
        let created = self
            .guarded(self.backend.create_session(&self.credential))
            .await?;
        let entries = self
            .guarded(
                self.backend
                    .chat_history(&self.credential, &created.session_id),
            )
            .await?;
        Ok((created.session_id, created.created_at, entries))
    }

    pub fn select_thread(&self, id: ThreadId) -> Result<()> {
        self.registry().select(id)
    }

    /// Fetch a thread's history if it has never been fetched. Returns true
    /// when a fetch ran and succeeded.
    pub async fn ensure_messages_loaded(&self, id: ThreadId) -> Result<bool> {
        let session_id = self.registry().begin_history_load(id)?;
        let Some(session_id) = session_id else {
            return Ok(false);
        };

        let settle = Settle::new(&self.state, move |registry| {
            registry.finish_history_load(id, None)
        });

        tracing::debug!("Fetching history for session {}", session_id);
        let entries = match self
            .guarded(self.backend.chat_history(&self.credential, &session_id))
            .await
        {
            Ok(entries) => Some(entries),
            Err(e) => {
                tracing::warn!("Could not load history for session {}: {}", session_id, e);
                None
            }
        };

        settle.disarm();
        let loaded = entries.is_some();
        self.registry().finish_history_load(id, entries);
        Ok(loaded)
    }

    /// Delete remotely, then locally. A refused delete leaves every thread
    /// as it was.
    pub async fn delete_thread(&self, id: ThreadId) -> Result<()> {
        let session_id = self
            .registry()
            .get(id)
            .map(|t| t.session_id.clone())
            .ok_or(CoreError::UnknownThread(id))?;

        tracing::debug!("Deleting chat session {}", session_id);
        match self
            .guarded(self.backend.delete_session(&self.credential, &session_id))
            .await
        {
            Ok(_) => {}
            Err(CoreError::Client(e)) => {
                tracing::warn!("Backend refused to delete {}: {}", session_id, e);
                return Err(CoreError::DeleteRejected {
                    session_id,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }

        let mut registry = self.registry();
        if registry.get(id).is_some() {
            registry.remove(id)?;
        }
        tracing::info!("Deleted chat session {}", session_id);
        Ok(())
    }

    /// Send `text` in a thread and wait for the reply.
    ///
    /// The thread gains exactly two messages unless the send is skipped: the
    /// user's text and the assistant's reply, or the apology when the request
    /// fails, is cancelled, or this future is dropped.
    pub async fn send_message(&self, thread_id: ThreadId, text: &str) -> SendOutcome {
        let pending = self.registry().begin_send(thread_id, text);
        let pending = match pending {
            Ok(pending) => pending,
            Err(reason) => {
                tracing::debug!("Send to thread {} skipped: {}", thread_id, reason);
                return SendOutcome::Skipped(reason);
            }
        };

        let abandoned = pending.clone();
        let settle = Settle::new(&self.state, move |registry| {
            registry.finish_send(&abandoned, None);
        });

        let reply = self.request_reply(&pending).await;

        settle.disarm();
        self.registry().finish_send(&pending, reply)
    }

    async fn request_reply(&self, pending: &PendingSend) -> Option<String> {
        tracing::debug!("Sending message in session {}", pending.session_id);
        let request = ChatRequest::new(pending.message.clone(), pending.session_id.clone());
        match self
            .guarded(self.backend.chat(&self.credential, request))
            .await
        {
            Ok(response) => Some(response.response),
            Err(e) => {
                tracing::warn!("Chat request in session {} failed: {}", pending.session_id, e);
                None
            }
        }
    }

    pub fn threads(&self) -> Vec<ChatThread> {
        self.registry().threads().to_vec()
    }

    pub fn thread(&self, id: ThreadId) -> Option<ChatThread> {
        self.registry().get(id).cloned()
    }

    pub fn current(&self) -> Option<ChatThread> {
        self.registry().current().cloned()
    }

    pub fn selected(&self) -> Option<ThreadId> {
        self.registry().selected()
    }

    pub fn is_sending(&self, id: ThreadId) -> bool {
        self.registry().is_sending(id)
    }

    /// Abort every request in flight and refuse new ones
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn registry(&self) -> MutexGuard<'_, ChatRegistry> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn guarded<T, F>(&self, request: F) -> Result<T>
    where
        F: Future<Output = trace_client::Result<T>>,
    {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(CoreError::Cancelled),
            result = request => result.map_err(CoreError::from),
        }
    }
}

impl Drop for ChatController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Applies a registry transition if the surrounding operation is dropped
/// before it settles on its own.
struct Settle<'a, F: FnOnce(&mut ChatRegistry)> {
    state: &'a Mutex<ChatRegistry>,
    on_drop: Option<F>,
}

impl<'a, F: FnOnce(&mut ChatRegistry)> Settle<'a, F> {
    fn new(state: &'a Mutex<ChatRegistry>, on_drop: F) -> Self {
        Self {
            state,
            on_drop: Some(on_drop),
        }
    }

    fn disarm(mut self) {
        self.on_drop = None;
    }
}

impl<F: FnOnce(&mut ChatRegistry)> Drop for Settle<'_, F> {
    fn drop(&mut self) {
        if let Some(settle) = self.on_drop.take() {
            let mut registry = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            settle(&mut registry);
        }
    }
}
