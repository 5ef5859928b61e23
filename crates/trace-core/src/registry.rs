//! Ordered set of conversation threads for the signed-in user.
//!
//! Pure state: every network round trip lives in `ChatController`, which
//! feeds results back through the transitions defined here. After
//! initialization the registry is never empty and exactly one thread is
//! selected.

use crate::error::{CoreError, Result};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use trace_client::{HistoryEntry, SessionSummary};
use trace_types::{generate_session_id, ChatThread, Sender, ThreadId};

#[derive(Debug, Default)]
pub struct ChatRegistry {
    threads: Vec<ChatThread>,
    selected: Option<ThreadId>,
    next_thread_id: u64,
    /// Threads with a reply outstanding, keyed to their placeholder's id
    pub(crate) sending: HashMap<ThreadId, u64>,
    loading: HashSet<ThreadId>,
}

impl ChatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threads(&self) -> &[ChatThread] {
        &self.threads
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn get(&self, id: ThreadId) -> Option<&ChatThread> {
        self.threads.iter().find(|t| t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: ThreadId) -> Option<&mut ChatThread> {
        self.threads.iter_mut().find(|t| t.id == id)
    }

    pub fn selected(&self) -> Option<ThreadId> {
        self.selected
    }

    pub fn current(&self) -> Option<&ChatThread> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Replace the registry with the backend's sessions, in backend order,
    /// selecting the first. An empty listing yields one local default.
    pub fn install_remote(&mut self, sessions: Vec<SessionSummary>) -> ThreadId {
        if sessions.is_empty() {
            return self.install_default();
        }

        self.reset();
        for session in sessions {
            let id = self.allocate_id();
            let created_at = session.created_at.unwrap_or_else(Utc::now);
            let mut thread =
                ChatThread::from_remote(id, session.session_id, session.title, created_at);
            thread.updated_at = session.updated_at;
            thread.message_count = session.message_count;
            self.threads.push(thread);
        }

        let first = self.threads[0].id;
        self.selected = Some(first);
        first
    }

    /// Replace the registry with a single fresh local thread
    pub fn install_default(&mut self) -> ThreadId {
        self.reset();
        let id = self.allocate_id();
        self.threads
            .push(ChatThread::new_local(id, generate_session_id()));
        self.selected = Some(id);
        id
    }

    /// Insert a new thread at the front and select it
    pub fn prepend<F>(&mut self, build: F) -> ThreadId
    where
        F: FnOnce(ThreadId) -> ChatThread,
    {
        let id = self.allocate_id();
        self.threads.insert(0, build(id));
        self.selected = Some(id);
        id
    }

    /// Change the current thread. No network effect.
    pub fn select(&mut self, id: ThreadId) -> Result<()> {
        if self.get(id).is_none() {
            return Err(CoreError::UnknownThread(id));
        }
        self.selected = Some(id);
        Ok(())
    }

    /// Drop a thread locally. The last thread is replaced by a fresh
    /// default; deleting the selection moves it to the new first thread.
    pub fn remove(&mut self, id: ThreadId) -> Result<()> {
        let index = self
            .threads
            .iter()
            .position(|t| t.id == id)
            .ok_or(CoreError::UnknownThread(id))?;

        if self.threads.len() == 1 {
            self.install_default();
            return Ok(());
        }

        self.threads.remove(index);
        self.sending.remove(&id);
        self.loading.remove(&id);

        if self.selected == Some(id) {
            self.selected = self.threads.first().map(|t| t.id);
        }
        Ok(())
    }

    /// Mark a history fetch as started. Returns the session to fetch, or
    /// `None` when the thread is loaded, already has messages, or a fetch
    /// is in flight.
    pub fn begin_history_load(&mut self, id: ThreadId) -> Result<Option<String>> {
        let thread = self.get(id).ok_or(CoreError::UnknownThread(id))?;
        if thread.messages_loaded || !thread.messages.is_empty() || self.loading.contains(&id) {
            return Ok(None);
        }
        let session_id = thread.session_id.clone();
        self.loading.insert(id);
        Ok(Some(session_id))
    }

    /// Settle a history fetch. `None` means it failed; the thread stays
    /// unloaded so a later selection retries.
    pub fn finish_history_load(&mut self, id: ThreadId, entries: Option<Vec<HistoryEntry>>) {
        self.loading.remove(&id);
        let Some(entries) = entries else {
            return;
        };
        let Some(thread) = self.get_mut(id) else {
            return;
        };
        thread.load_history(history_turns(entries));
        let placeholder = thread.pending_id();

        // Loading renumbers local messages; keep the outstanding send on its placeholder
        if let (Some(slot), Some(placeholder)) = (self.sending.get_mut(&id), placeholder) {
            *slot = placeholder;
        }
    }

    pub fn is_loading(&self, id: ThreadId) -> bool {
        self.loading.contains(&id)
    }

    fn allocate_id(&mut self) -> ThreadId {
        self.next_thread_id += 1;
        ThreadId(self.next_thread_id)
    }

    fn reset(&mut self) {
        self.threads.clear();
        self.sending.clear();
        self.loading.clear();
        self.selected = None;
    }
}

/// Flatten stored exchanges into messages. Entries with a blank user side
/// (session creation artifacts) contribute only the assistant's text.
pub fn history_turns(entries: Vec<HistoryEntry>) -> Vec<(Sender, String)> {
    let mut turns = Vec::with_capacity(entries.len() * 2);
    for entry in entries {
        if !entry.user_message.trim().is_empty() {
            turns.push((Sender::User, entry.user_message));
        }
        turns.push((Sender::Assistant, entry.ai_response));
    }
    turns
}
