//! Session Change Events
//!
//! Pushed by the auth service whenever the authenticated identity changes.

use serde::Serialize;

use super::session::Session;

/// What happened to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionChangeKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl SessionChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
        }
    }
}

/// Change notification: the kind plus the session after the change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChangeEvent {
    pub kind: SessionChangeKind,
    pub session: Option<Session>,
}

impl SessionChangeEvent {
    pub fn new(kind: SessionChangeKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }

    pub fn signed_in(session: Session) -> Self {
        Self::new(SessionChangeKind::SignedIn, Some(session))
    }

    pub fn signed_out() -> Self {
        Self::new(SessionChangeKind::SignedOut, None)
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self::new(SessionChangeKind::TokenRefreshed, Some(session))
    }

    pub fn user_updated(session: Session) -> Self {
        Self::new(SessionChangeKind::UserUpdated, Some(session))
    }
}
