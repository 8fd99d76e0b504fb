//! Route guards.
//!
//! Every screen declares a [`Policy`]. [`evaluate`] turns the policy and the
//! current [`Session`] into a [`GuardDecision`]: render the screen, show a
//! placeholder while the session is still resolving, or send the user
//! somewhere else. Guards are pure so frontends and tests share them.

use api::Mode;

use crate::session::{Session, SessionStatus};

/// Screens of the app.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    ModeSelection,
    Login,
    Register,
    Dashboard,
    Profile,
    MemberDetail(String),
    AddMember,
}

/// Who may see a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Public,
    RequiresAuth,
    RequiresNgoMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    ShowLoading,
    Redirect(Destination),
}

impl Destination {
    pub fn policy(&self) -> Policy {
        match self {
            Destination::ModeSelection | Destination::Login | Destination::Register => Policy::Public,
            Destination::Dashboard | Destination::Profile => Policy::RequiresAuth,
            Destination::MemberDetail(_) | Destination::AddMember => Policy::RequiresNgoMode,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Destination::ModeSelection => "/".to_string(),
            Destination::Login => "/login".to_string(),
            Destination::Register => "/register".to_string(),
            Destination::Dashboard => "/dashboard".to_string(),
            Destination::Profile => "/profile".to_string(),
            Destination::MemberDetail(id) => format!("/member/{id}"),
            Destination::AddMember => "/add-member".to_string(),
        }
    }

    pub fn from_path(path: &str) -> Option<Destination> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Destination::ModeSelection),
            "/login" => Some(Destination::Login),
            "/register" => Some(Destination::Register),
            "/dashboard" => Some(Destination::Dashboard),
            "/profile" => Some(Destination::Profile),
            "/add-member" => Some(Destination::AddMember),
            other => other
                .strip_prefix("/member/")
                .filter(|id| !id.is_empty() && !id.contains('/'))
                .map(|id| Destination::MemberDetail(id.to_string())),
        }
    }
}

/// Signed-in users only.
pub fn requires_auth(session: &Session) -> GuardDecision {
    match session.status {
        SessionStatus::Loading => GuardDecision::ShowLoading,
        SessionStatus::Authenticated if session.user.is_some() => GuardDecision::Allow,
        _ => GuardDecision::Redirect(Destination::Login),
    }
}

/// Signed-in NGO users only; personal users go back to their dashboard.
pub fn requires_ngo_mode(session: &Session) -> GuardDecision {
    match requires_auth(session) {
        GuardDecision::Allow if session.mode() == Some(Mode::Ngo) => GuardDecision::Allow,
        GuardDecision::Allow => GuardDecision::Redirect(Destination::Dashboard),
        other => other,
    }
}

pub fn evaluate(session: &Session, target: &Destination) -> GuardDecision {
    match target.policy() {
        Policy::Public => GuardDecision::Allow,
        Policy::RequiresAuth => requires_auth(session),
        Policy::RequiresNgoMode => requires_ngo_mode(session),
    }
}
