//! Session Entity
//!
//! The authenticated identity and token bundle issued by the auth service.
//! Persisted as camelCase JSON in the session store.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Token string wiped from memory on drop and redacted in `Debug`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value, for building request headers only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken(***)")
    }
}

/// Auth session entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Authenticated user (subject) identifier
    pub subject_id: String,
    /// Issue time (Unix timestamp seconds)
    pub issued_at: i64,
    /// Expiry (Unix timestamp seconds); `None` never expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub access_token: SecretToken,
    pub refresh_token: SecretToken,
}

impl Session {
    pub fn new(
        subject_id: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        issued_at: i64,
        expires_at: Option<i64>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            issued_at,
            expires_at,
            access_token: SecretToken::new(access_token),
            refresh_token: SecretToken::new(refresh_token),
        }
    }

    /// Session issued at `issued_at` that expires after `ttl`
    pub fn issue(
        subject_id: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        issued_at: i64,
        ttl: Duration,
    ) -> Self {
        let expires_at = issued_at + ttl.as_secs() as i64;
        Self::new(subject_id, access_token, refresh_token, issued_at, Some(expires_at))
    }

    /// `expires_at * 1000 < now_ms`; sessions without expiry never expire
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at.saturating_mul(1000) < now_ms)
    }

    /// True when the session expires within `margin` of `now_ms` (or already has)
    pub fn expires_within(&self, now_ms: i64, margin: Duration) -> bool {
        self.remaining_ms(now_ms)
            .is_some_and(|remaining| remaining <= margin.as_millis() as i64)
    }

    /// Milliseconds until expiry, clamped at 0; `None` if it never expires
    pub fn remaining_ms(&self, now_ms: i64) -> Option<i64> {
        self.expires_at
            .map(|expires_at| expires_at.saturating_mul(1000).saturating_sub(now_ms).max(0))
    }

    /// `Authorization` header value for requests to the remote service
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose())
    }
}
