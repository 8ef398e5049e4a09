//! Auth Client Trait
//!
//! The remote authentication service the controller talks to. Implementations
//! live outside this crate (HTTP client, test doubles).

use crate::domain::entity::session::Session;
use crate::error::AuthResult;
use crate::infra::channel::SessionSubscription;

/// Remote auth service
#[trait_variant::make(AuthClient: Send)]
pub trait LocalAuthClient {
    /// Current session as known by the service, if any
    async fn get_session(&self) -> AuthResult<Option<Session>>;

    /// End the session on the service side
    async fn sign_out(&self) -> AuthResult<()>;

    /// Exchange the refresh token for a new session
    async fn refresh_session(&self) -> AuthResult<Option<Session>>;

    /// Register for change notifications; dropping the handle unsubscribes
    fn on_session_change(&self) -> SessionSubscription;
}
