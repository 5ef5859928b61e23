//! Prelude module for convenient imports
//!
//! ```rust
//! use trace::prelude::*;
//! ```

pub use crate::{
    App, AppBuilder, AppSettings, BackendConfig, BurnJournal, ChatController, ChatThread,
    CoreError, Credential, CredentialStore, FileStore, HttpBackend, JournalBackend, LoginForm,
    MemoryStore, Message, NavAction, RegisterForm, Screen, SendOutcome, ThreadId, User,
};
