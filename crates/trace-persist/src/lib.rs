pub mod error;
pub mod session;
pub mod store;

pub use error::{PersistError, Result};
pub use session::{SessionStore, ACCESS_TOKEN_KEY, USER_KEY};
pub use store::{CredentialStore, FileStore, MemoryStore};
