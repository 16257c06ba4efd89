//! Authentication session trait.
//!
//! The identity provider itself lives outside this workspace; the client only
//! asks who is signed in and which bearer credential to attach.

use serde::{Deserialize, Serialize};

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user id (e.g. the identity provider's `sub`).
    pub user_id: String,
    /// Login name or e-mail, for display.
    pub username: String,
}

/// Read access to the current authentication state.
///
/// # Security Note
///
/// Implementations must never log the bearer credential.
#[async_trait::async_trait]
pub trait AuthSession: Send + Sync {
    /// Returns the signed-in user, if any.
    async fn current_user(&self) -> Option<UserIdentity>;

    /// Returns the credential to send as `Authorization: Bearer <token>`.
    ///
    /// `None` is a normal answer: requests then go out unauthenticated.
    async fn bearer_token(&self) -> Option<String>;

    async fn is_authenticated(&self) -> bool {
        self.current_user().await.is_some()
    }
}
