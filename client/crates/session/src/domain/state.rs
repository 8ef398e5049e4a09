//! Controller State
//!
//! What the UI observes: the current session, whether the initial fetch is
//! still running and the last recorded error.

use serde::Serialize;

use super::entity::session::Session;

/// Auth lifecycle phase
///
/// `Uninitialized -> Loading -> {Authenticated, Anonymous}`. Once resolved the
/// phase flips between the two resolved states as notifications arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthPhase {
    #[default]
    Uninitialized,
    Loading,
    Authenticated,
    Anonymous,
}

impl AuthPhase {
    pub fn for_session(session: Option<&Session>) -> Self {
        if session.is_some() {
            Self::Authenticated
        } else {
            Self::Anonymous
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Anonymous)
    }
}

/// Observable controller state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub phase: AuthPhase,
    pub session: Option<Session>,
    pub last_error: Option<String>,
    /// Bumped every time a session (or its absence) is adopted
    pub version: u64,
}

impl SessionSnapshot {
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, AuthPhase::Uninitialized | AuthPhase::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.subject_id.as_str())
    }
}
