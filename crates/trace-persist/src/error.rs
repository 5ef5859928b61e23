use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stored value for '{key}' is corrupt")]
    Corrupt { key: String },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;
