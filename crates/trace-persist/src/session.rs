use crate::error::{PersistError, Result};
use crate::store::CredentialStore;
use trace_types::{AuthSession, Credential, User};

pub const USER_KEY: &str = "user";
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Signed-in user and bearer credential, mirrored to durable storage
///
/// User and credential are always present together or absent together, in
/// memory and on disk.
pub struct SessionStore<S: CredentialStore> {
    store: S,
    current: Option<AuthSession>,
}

impl<S: CredentialStore> SessionStore<S> {
    /// Empty store; call `restore` to pick up a previous session
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&AuthSession> {
        self.current.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.current.as_ref().map(|s| &s.credential)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn login(&mut self, user: User, credential: Credential) -> Result<()> {
        tracing::info!("Signing in as {}", user.username);
        self.install(user, credential)
    }

    pub fn register(&mut self, user: User, credential: Credential) -> Result<()> {
        tracing::info!("Registered and signed in as {}", user.username);
        self.install(user, credential)
    }

    /// Load a previously stored pair. Returns true when both halves were
    /// present and readable; a lone or unreadable half is cleared.
    pub fn restore(&mut self) -> Result<bool> {
        let user = self.store.get(USER_KEY)?;
        let token = self.store.get(ACCESS_TOKEN_KEY)?;

        match (user, token) {
            (Some(raw_user), Some(token)) if !token.trim().is_empty() => {
                match serde_json::from_str::<User>(&raw_user) {
                    Ok(user) => {
                        tracing::info!("Restored session for {}", user.username);
                        self.current = Some(AuthSession::new(user, Credential::new(token)));
                        Ok(true)
                    }
                    Err(e) => {
                        tracing::warn!("Discarding unreadable stored user: {}", e);
                        self.clear_storage()?;
                        Ok(false)
                    }
                }
            }
            (None, None) => Ok(false),
            _ => {
                tracing::warn!("Discarding incomplete stored session");
                self.clear_storage()?;
                Ok(false)
            }
        }
    }

    pub fn logout(&mut self) -> Result<()> {
        if let Some(session) = self.current.take() {
            tracing::info!("Signing out {}", session.user.username);
        }
        self.clear_storage()
    }

    fn install(&mut self, user: User, credential: Credential) -> Result<()> {
        if credential.is_empty() {
            return Err(PersistError::Corrupt {
                key: ACCESS_TOKEN_KEY.to_string(),
            });
        }

        let raw_user = serde_json::to_string(&user)?;
        let written = self
            .store
            .set(USER_KEY, &raw_user)
            .and_then(|_| self.store.set(ACCESS_TOKEN_KEY, credential.expose()));

        if let Err(e) = written {
            tracing::error!("Failed to persist session: {}", e);
            // Never leave one half behind
            let _ = self.clear_storage();
            return Err(e);
        }

        self.current = Some(AuthSession::new(user, credential));
        Ok(())
    }

    fn clear_storage(&self) -> Result<()> {
        self.store.remove(USER_KEY)?;
        self.store.remove(ACCESS_TOKEN_KEY)?;
        Ok(())
    }
}
