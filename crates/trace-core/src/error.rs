use crate::auth::FormErrors;
use thiserror::Error;
use trace_client::ClientError;
use trace_persist::PersistError;
use trace_types::{Screen, ThreadId};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("Invalid form: {0}")]
    Validation(FormErrors),

    /// Login or registration refused; the message is fit for display
    #[error("{0}")]
    Auth(String),

    #[error("Unknown thread: {0}")]
    UnknownThread(ThreadId),

    #[error("Failed to delete chat {session_id}: {reason}")]
    DeleteRejected { session_id: String, reason: String },

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Cannot open {target:?} from {from:?}")]
    Navigation { from: Screen, target: Screen },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
