pub mod analysis;
pub mod app;
pub mod auth;
pub mod builder;
pub mod burn;
pub mod controller;
pub mod error;
pub mod exchange;
pub mod registry;

pub use analysis::{AnalysisRequestor, AnalysisState, DEFAULT_ANALYSIS_DAYS};
pub use app::{App, AppSettings};
pub use auth::{AuthFlow, FormErrors, LoginForm, RegisterForm};
pub use builder::AppBuilder;
pub use burn::{BurnJournal, BurnState, DEFAULT_BURN_DELAY};
pub use controller::ChatController;
pub use error::{CoreError, Result};
pub use exchange::{PendingSend, SendOutcome, SkipReason};
pub use registry::ChatRegistry;
