//! # Trace
//!
//! Client library for the Trace journaling companion: a signed-in user talks
//! to an assistant in conversation threads, asks for an analysis of recent
//! entries, and can write text that is thrown away instead of saved.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trace::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut app = AppBuilder::new()
//!         .backend_config(BackendConfig::new("http://localhost:3001"))
//!         .store(FileStore::new("/tmp/trace"))
//!         .build()?;
//!
//!     if app.start()? != Screen::Home {
//!         app.login(&LoginForm::new("jane", "secret1")).await?;
//!     }
//!
//!     let chat = app.open_chat().await?;
//!     if let Some(id) = chat.selected() {
//!         chat.send_message(id, "Today was long.").await;
//!         if let Some(reply) = chat.thread(id).and_then(|t| t.messages.last().cloned()) {
//!             println!("{}", reply.text);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`trace-types`**: users, credentials, threads, messages, screens
//! - **`trace-client`**: backend trait and its HTTP implementation
//! - **`trace-persist`**: durable storage of the signed-in session
//! - **`trace-core`**: chat registry, message exchange, analysis, burn journal, app

pub mod prelude;

pub use trace_types::{
    AnalysisResult, AuthSession, ChatThread, Credential, Message, MessageStatus, NavAction,
    Screen, Sender, ThreadId, User,
};

pub use trace_client::{
    AnalysisClient, AuthClient, BackendConfig, ChatSessionClient, ClientError, HttpBackend,
    HttpBackendBuilder, JournalBackend,
};

pub use trace_persist::{
    CredentialStore, FileStore, MemoryStore, PersistError, SessionStore,
};

pub use trace_core::{
    AnalysisRequestor, AnalysisState, App, AppBuilder, AppSettings, AuthFlow, BurnJournal,
    BurnState, ChatController, ChatRegistry, CoreError, FormErrors, LoginForm, RegisterForm,
    SendOutcome, SkipReason,
};
