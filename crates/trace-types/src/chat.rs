use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_THREAD_TITLE: &str = "New Chat";
pub const TITLE_MAX_CHARS: usize = 30;
const TITLE_ELLIPSIS: &str = "...";

pub const DEFAULT_GREETING: &str =
    "Hi! I'm Trace, your journaling companion. How are you feeling today?";
pub const APOLOGY_TEXT: &str = "Sorry, I couldn't process that. Please try again.";

const SESSION_SUFFIX_LEN: usize = 9;

/// Local sequence id of a thread within the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// Lifecycle of a message body
///
/// Only assistant placeholders are ever `Pending`; they leave that state
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Resolved,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within its thread only
    pub id: u64,
    pub sender: Sender,
    pub text: String,
    pub status: MessageStatus,
}

impl Message {
    pub fn user(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::User,
            text: text.into(),
            status: MessageStatus::Resolved,
        }
    }

    pub fn assistant(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::Assistant,
            text: text.into(),
            status: MessageStatus::Resolved,
        }
    }

    pub fn pending(id: u64) -> Self {
        Self {
            id,
            sender: Sender::Assistant,
            text: String::new(),
            status: MessageStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }
}

/// One conversation thread as held by the client
#[derive(Debug, Clone, PartialEq)]
pub struct ChatThread {
    pub id: ThreadId,
    /// Backend session identifier
    pub session_id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub message_count: Option<u32>,
    pub messages_loaded: bool,
    next_message_id: u64,
}

impl ChatThread {
    /// Thread with nothing to fetch: synthesized locally or freshly created
    pub fn new_local(id: ThreadId, session_id: impl Into<String>) -> Self {
        Self {
            id,
            session_id: session_id.into(),
            title: DEFAULT_THREAD_TITLE.to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
            message_count: None,
            messages_loaded: true,
            next_message_id: 1,
        }
    }

    /// Thread listed by the backend whose history is fetched lazily
    pub fn from_remote(
        id: ThreadId,
        session_id: impl Into<String>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            created_at,
            messages_loaded: false,
            ..Self::new_local(id, session_id)
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Append a message, returning its id
    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> u64 {
        let id = self.take_message_id();
        let message = match sender {
            Sender::User => Message::user(id, text),
            Sender::Assistant => Message::assistant(id, text),
        };
        self.messages.push(message);
        id
    }

    /// Append a pending assistant placeholder, returning its id
    pub fn push_pending(&mut self) -> u64 {
        let id = self.take_message_id();
        self.messages.push(Message::pending(id));
        id
    }

    /// Settle a pending placeholder. Returns false when no pending message
    /// with that id exists.
    pub fn resolve(&mut self, message_id: u64, text: impl Into<String>, status: MessageStatus) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|m| m.id == message_id && m.is_pending())
        {
            Some(message) => {
                message.text = text.into();
                message.status = status;
                true
            }
            None => false,
        }
    }

    /// Install fetched history in server order, ahead of any messages
    /// appended locally while the fetch was in flight. Ids are reassigned
    /// from 1 so they keep increasing down the list.
    pub fn load_history<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (Sender, String)>,
    {
        let local = std::mem::take(&mut self.messages);
        self.next_message_id = 1;
        for (sender, text) in entries {
            self.push(sender, text);
        }
        for mut message in local {
            message.id = self.take_message_id();
            self.messages.push(message);
        }
        self.messages_loaded = true;
    }

    /// Id of the placeholder still waiting for a reply, if any
    pub fn pending_id(&self) -> Option<u64> {
        self.messages.iter().find(|m| m.is_pending()).map(|m| m.id)
    }

    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.sender == Sender::User)
    }

    pub fn has_pending(&self) -> bool {
        self.messages.iter().any(Message::is_pending)
    }

    /// Short age label for thread lists
    pub fn relative_age(&self, now: DateTime<Utc>) -> String {
        let days = (now - self.created_at).num_days();
        match days {
            d if d <= 0 => "Today".to_string(),
            1 => "Yesterday".to_string(),
            d if d < 7 => format!("{} days ago", d),
            _ => self.created_at.format("%Y-%m-%d").to_string(),
        }
    }

    fn take_message_id(&mut self) -> u64 {
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }
}

/// Title derived from a first message: at most 30 characters, with an
/// ellipsis appended when cut
pub fn truncate_title(text: &str) -> String {
    if text.chars().count() <= TITLE_MAX_CHARS {
        return text.to_string();
    }
    let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    title.push_str(TITLE_ELLIPSIS);
    title
}

/// Fresh client-side session identifier: millisecond clock plus a random suffix
pub fn generate_session_id() -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(SESSION_SUFFIX_LEN)
        .collect();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}
