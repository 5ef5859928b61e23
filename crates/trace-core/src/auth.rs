//! Sign-in and sign-up: form validation and the backend round trip.
//!
//! Validation runs before any request; a form with errors never reaches the
//! network.

use crate::error::{CoreError, Result};
use regex::Regex;
use std::fmt;
use std::sync::{Arc, LazyLock};
use trace_client::{AuthClient, JournalBackend, LoginRequest, RegisterRequest};
use trace_types::{Credential, User};

const MIN_PASSWORD_CHARS: usize = 6;
const DEFAULT_LANGUAGE: &str = "en";

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\S+@\S+\.\S+").unwrap_or_else(|err| panic!("valid email regex: {err}"))
});
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+").unwrap_or_else(|err| panic!("valid whitespace regex: {err}"))
});

/// Per-field validation messages, in form order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: Vec<(&'static str, String)>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.push((field, message.into()));
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(name, message)| (*name, message.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    fn into_result(self) -> std::result::Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> std::result::Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.username.trim().is_empty() {
            errors.insert("username", "Username is required");
        }
        if self.password.is_empty() {
            errors.insert("password", "Password is required");
        }
        errors.into_result()
    }

    pub fn to_request(&self) -> std::result::Result<LoginRequest, FormErrors> {
        self.validate()?;
        Ok(LoginRequest::new(self.username.clone(), self.password.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct RegisterForm {
    /// Display name; the login name is derived from it
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub language: String,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl RegisterForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            name: name.into(),
            email: email.into(),
            confirm_password: password.clone(),
            password,
            ..Default::default()
        }
    }

    pub fn with_confirmation(mut self, confirm_password: impl Into<String>) -> Self {
        self.confirm_password = confirm_password.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn validate(&self) -> std::result::Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        if self.name.trim().is_empty() {
            errors.insert("name", "Username is required");
        }

        if self.email.trim().is_empty() {
            errors.insert("email", "Email is required");
        } else if !is_email_shaped(&self.email) {
            errors.insert("email", "Email is invalid");
        }

        if self.password.is_empty() {
            errors.insert("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_CHARS {
            errors.insert("password", "Password must be at least 6 characters");
        }

        if self.confirm_password.is_empty() {
            errors.insert("confirm_password", "Please confirm your password");
        } else if self.password != self.confirm_password {
            errors.insert("confirm_password", "Passwords do not match");
        }

        errors.into_result()
    }

    /// Login name derived from the display name: trimmed, whitespace runs
    /// collapsed to `_`, lowercased
    pub fn username(&self) -> String {
        WHITESPACE_RUN
            .replace_all(self.name.trim(), "_")
            .to_lowercase()
    }

    pub fn to_request(&self) -> std::result::Result<RegisterRequest, FormErrors> {
        self.validate()?;
        let language = if self.language.trim().is_empty() {
            DEFAULT_LANGUAGE.to_string()
        } else {
            self.language.clone()
        };
        Ok(RegisterRequest {
            username: self.username(),
            email: self.email.clone(),
            password: self.password.clone(),
            full_name: self.name.clone(),
            language,
        })
    }
}

fn is_email_shaped(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

/// Backend half of sign-in and sign-up. Installing the returned pair is the
/// session store's job.
#[derive(Clone)]
pub struct AuthFlow {
    backend: Arc<dyn JournalBackend>,
}

impl AuthFlow {
    pub fn new(backend: Arc<dyn JournalBackend>) -> Self {
        Self { backend }
    }

    pub async fn login(&self, form: &LoginForm) -> Result<(User, Credential)> {
        let request = form.to_request().map_err(CoreError::Validation)?;
        tracing::debug!("Logging in as {}", request.username);

        match self.backend.login(request).await {
            Ok(response) => Ok((response.user, Credential::new(response.access_token))),
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                Err(CoreError::Auth(e.user_message("Login failed")))
            }
        }
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<(User, Credential)> {
        let request = form.to_request().map_err(CoreError::Validation)?;
        tracing::debug!("Registering {}", request.username);

        match self.backend.register(request).await {
            Ok(response) => Ok((response.user, Credential::new(response.access_token))),
            Err(e) => {
                tracing::warn!("Registration failed: {}", e);
                Err(CoreError::Auth(e.user_message("Registration failed")))
            }
        }
    }
}
