use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated user as returned by the auth endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::timestamp::deserialize_lenient"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_language() -> String {
    "en".to_string()
}

impl User {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: String::new(),
            full_name: String::new(),
            language: default_language(),
            created_at: None,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

/// Opaque bearer token
///
/// `Debug` and `Display` redact the value so it never lands in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// User and credential, always held together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: User,
    pub credential: Credential,
}

impl AuthSession {
    pub fn new(user: User, credential: Credential) -> Self {
        Self { user, credential }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_backend_payload() {
        let json = r#"{
            "id": 7,
            "username": "jane_doe",
            "email": "jane@example.com",
            "full_name": "Jane Doe",
            "language": "es",
            "created_at": "2024-05-01T12:00:00.000123"
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.language, "es");
        assert!(user.created_at.is_some());
        assert_eq!(user.display_name(), "Jane Doe");
    }

    #[test]
    fn test_user_minimal_payload() {
        let user: User = serde_json::from_str(r#"{"id": 1, "username": "sam"}"#).unwrap();
        assert_eq!(user.language, "en");
        assert_eq!(user.display_name(), "sam");
    }

    #[test]
    fn test_credential_redacted() {
        let credential = Credential::new("secret-token");
        assert_eq!(format!("{:?}", credential), "Credential(***)");
        assert_eq!(credential.to_string(), "***");
        assert_eq!(credential.expose(), "secret-token");
    }

    #[test]
    fn test_credential_serializes_as_plain_string() {
        let json = serde_json::to_string(&Credential::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
