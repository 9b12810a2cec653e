//! Domain service for sign-in, token resolution, and sign-out.

use async_trait::async_trait;

use super::error::ServiceError;
use crate::db::User;

/// Outcome of a successful sign-in: the identity plus the raw remember token
/// issued to the client. Only the token's digest is persisted.
#[derive(Debug, Clone)]
pub struct SignInResult {
    pub user: User,
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials, mints a fresh remember token, and stores its
    /// digest on the user. A new sign-in supersedes any previously issued
    /// token for the same user (last-writer-wins).
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Authentication`] for unknown email and wrong
    /// password alike; the two cases are indistinguishable to the caller.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, ServiceError>;

    /// Resolves a presented token to its identity. Missing, invalid, or
    /// tampered tokens resolve to `None`, never an error.
    async fn resolve_token(&self, token: &str) -> Result<Option<User>, ServiceError>;

    /// Clears the server-side digest for the token's user, so the token can
    /// no longer authenticate from any client.
    async fn sign_out(&self, token: &str) -> Result<(), ServiceError>;
}
