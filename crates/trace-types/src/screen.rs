//! Top-level screen selection as an explicit state machine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    #[default]
    Start,
    Login,
    Register,
    Home,
    Chat,
    Burn,
    Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    ShowLogin,
    ShowRegister,
    BackToStart,
    /// Login or registration completed, or a stored session was restored
    Authenticated,
    OpenChat,
    OpenBurn,
    OpenAnalysis,
    BackToHome,
    LoggedOut,
}

impl Screen {
    pub fn requires_auth(self) -> bool {
        matches!(
            self,
            Screen::Home | Screen::Chat | Screen::Burn | Screen::Analysis
        )
    }

    /// Next screen for an action. Pairs without a defined transition, and
    /// transitions into post-auth screens while unauthenticated, leave the
    /// screen unchanged.
    pub fn apply(self, action: NavAction, authenticated: bool) -> Screen {
        use NavAction::*;
        use Screen::*;

        let next = match (self, action) {
            (_, LoggedOut) => Start,
            (_, Authenticated) => Home,
            (Start | Register, ShowLogin) => Login,
            (Start | Login, ShowRegister) => Register,
            (Login | Register, BackToStart) => Start,
            (Home, OpenChat) => Chat,
            (Home, OpenBurn) => Burn,
            (Home, OpenAnalysis) => Analysis,
            (Chat | Burn | Analysis, BackToHome) => Home,
            (current, _) => current,
        };

        if next.requires_auth() && !authenticated {
            self
        } else {
            next
        }
    }
}
