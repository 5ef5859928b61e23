//! Message exchange: the local half of a send.
//!
//! A send is split in two around the network call. `begin_send` appends the
//! user message and a pending assistant placeholder and marks the thread as
//! in flight; `finish_send` resolves that placeholder by id and clears the
//! mark. Both are applied to the latest registry state, so a send never
//! overwrites changes made while its request was outstanding.

use crate::registry::ChatRegistry;
use std::fmt;
use trace_types::{truncate_title, MessageStatus, Sender, ThreadId, APOLOGY_TEXT};

/// Why a send did not reach the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    BlankMessage,
    UnknownThread,
    /// The thread already has a reply outstanding
    AlreadySending,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::BlankMessage => write!(f, "message is blank"),
            SkipReason::UnknownThread => write!(f, "thread does not exist"),
            SkipReason::AlreadySending => write!(f, "a reply is still pending"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Skipped(SkipReason),
    /// Placeholder replaced by the assistant's reply
    Delivered,
    /// Placeholder replaced by the apology text
    Failed,
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SendOutcome::Delivered)
    }
}

/// Everything needed to issue the completion request and settle it later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub thread_id: ThreadId,
    pub session_id: String,
    pub message: String,
    pub placeholder_id: u64,
}

impl ChatRegistry {
    pub fn is_sending(&self, id: ThreadId) -> bool {
        self.sending.contains_key(&id)
    }

    /// Append the user message and a pending placeholder. Blank text, an
    /// unknown thread, or a reply already outstanding leave every thread
    /// untouched.
    pub fn begin_send(
        &mut self,
        thread_id: ThreadId,
        text: &str,
    ) -> std::result::Result<PendingSend, SkipReason> {
        if text.trim().is_empty() {
            return Err(SkipReason::BlankMessage);
        }
        if self.sending.contains_key(&thread_id) {
            return Err(SkipReason::AlreadySending);
        }
        let thread = self
            .get_mut(thread_id)
            .ok_or(SkipReason::UnknownThread)?;
        if thread.has_pending() {
            return Err(SkipReason::AlreadySending);
        }

        // An unloaded thread may already have user messages on the backend
        let first_user_message = thread.messages_loaded && !thread.has_user_message();

        thread.push(Sender::User, text);
        if first_user_message {
            thread.title = truncate_title(text);
        }
        let placeholder_id = thread.push_pending();
        let session_id = thread.session_id.clone();

        self.sending.insert(thread_id, placeholder_id);

        Ok(PendingSend {
            thread_id,
            session_id,
            message: text.to_string(),
            placeholder_id,
        })
    }

    /// Settle a send. `None` means the request failed or was abandoned and
    /// the placeholder becomes the apology text. A thread deleted in the
    /// meantime is ignored.
    pub fn finish_send(&mut self, pending: &PendingSend, reply: Option<String>) -> SendOutcome {
        let placeholder_id = self
            .sending
            .remove(&pending.thread_id)
            .unwrap_or(pending.placeholder_id);

        let (text, status) = match reply {
            Some(text) => (text, MessageStatus::Resolved),
            None => (APOLOGY_TEXT.to_string(), MessageStatus::Failed),
        };
        let delivered = status == MessageStatus::Resolved;

        match self.get_mut(pending.thread_id) {
            Some(thread) => {
                if !thread.resolve(placeholder_id, text, status) {
                    tracing::warn!(
                        "No pending reply {} in thread {}",
                        placeholder_id,
                        pending.thread_id
                    );
                }
            }
            None => tracing::debug!("Thread {} was removed before its reply", pending.thread_id),
        }

        if delivered {
            SendOutcome::Delivered
        } else {
            SendOutcome::Failed
        }
    }
}
