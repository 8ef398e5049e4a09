//! Session (client-side authentication state) Module
//!
//! Clean Architecture structure:
//! - `domain/` - Session entity, change events, controller state, auth client trait
//! - `application/` - The session controller and its configuration
//! - `infra/` - Change-notification channel and the persistent session store
//!
//! ## Lifecycle
//! `UNINITIALIZED -> LOADING -> {AUTHENTICATED, ANONYMOUS}`. Loading always
//! resolves, error or not. After that, change notifications from the auth
//! service are the single source of truth for who is signed in.
//!
//! ## Failure policy
//! - Initialization errors are recorded and resolve to anonymous
//! - `sign_out` / `refresh_session` errors are recorded and returned
//! - Storage errors never leave the store

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use application::config::SessionConfig;
pub use application::controller::SessionController;
pub use domain::client::AuthClient;
pub use domain::entity::event::{SessionChangeEvent, SessionChangeKind};
pub use domain::entity::session::{SecretToken, Session};
pub use domain::state::{AuthPhase, SessionSnapshot};
pub use error::{AuthError, AuthResult};
pub use infra::channel::{SessionChannel, SessionSubscription};
pub use infra::store::SessionStore;
