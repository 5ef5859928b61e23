pub mod analysis;
pub mod chat;
pub mod screen;
pub mod timestamp;
pub mod user;

pub use analysis::AnalysisResult;
pub use chat::{
    generate_session_id, truncate_title, ChatThread, Message, MessageStatus, Sender, ThreadId,
    APOLOGY_TEXT, DEFAULT_GREETING, DEFAULT_THREAD_TITLE, TITLE_MAX_CHARS,
};
pub use screen::{NavAction, Screen};
pub use user::{AuthSession, Credential, User};
