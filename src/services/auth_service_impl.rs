//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;

use crate::auth::{new_token, token_digest};
use crate::db::{Store, User};
use crate::services::auth_service::{AuthService, SignInResult};
use crate::services::error::ServiceError;
use crate::services::validation::normalize_email;

pub struct SeaOrmAuthService {
    store: Store,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, ServiceError> {
        let email = normalize_email(email);

        let is_valid = self.store.verify_user_password(&email, password).await?;
        if !is_valid {
            return Err(ServiceError::Authentication);
        }

        let user = self
            .store
            .get_user_by_email(&email)
            .await?
            .ok_or(ServiceError::Authentication)?;

        let token = new_token();
        self.store
            .set_remember_digest(user.id, Some(&token_digest(&token)))
            .await?;

        tracing::info!(user_id = user.id, "User signed in");

        Ok(SignInResult { user, token })
    }

    async fn resolve_token(&self, token: &str) -> Result<Option<User>, ServiceError> {
        if token.is_empty() {
            return Ok(None);
        }

        let user = self
            .store
            .get_user_by_remember_digest(&token_digest(token))
            .await?;

        Ok(user)
    }

    async fn sign_out(&self, token: &str) -> Result<(), ServiceError> {
        // Clearing the stored digest invalidates the token everywhere, not
        // just on the client that presented it.
        if let Some(user) = self.resolve_token(token).await? {
            self.store.set_remember_digest(user.id, None).await?;
            tracing::info!(user_id = user.id, "User signed out");
        }

        Ok(())
    }
}
