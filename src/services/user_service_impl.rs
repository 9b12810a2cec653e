//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;

use crate::config::SecurityConfig;
use crate::db::{Store, User};
use crate::services::error::ServiceError;
use crate::services::user_service::{NewUser, ProfileUpdate, UserPage, UserService};
use crate::services::validation;

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        let hash = self
            .store
            .hash_password_with_config(password, &self.security)
            .await?;
        Ok(hash)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, new_user: NewUser) -> Result<User, ServiceError> {
        validation::validate_name(&new_user.name)?;
        validation::validate_email(&new_user.email)?;
        validation::validate_password(&new_user.password)?;

        if new_user.password != new_user.password_confirmation {
            return Err(ServiceError::Validation(
                "Password doesn't match confirmation".to_string(),
            ));
        }

        let email = validation::normalize_email(&new_user.email);
        if self.store.email_taken(&email).await? {
            return Err(ServiceError::Validation(
                "Email has already been taken".to_string(),
            ));
        }

        let password_hash = self.hash_password(&new_user.password).await?;

        let user = self
            .store
            .create_user(new_user.name.trim(), &email, &password_hash, false)
            .await?;

        tracing::info!(user_id = user.id, "User registered");

        Ok(user)
    }

    async fn get(&self, id: i32) -> Result<User, ServiceError> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {id}")))
    }

    async fn list(
        &self,
        page: u64,
        page_size: u64,
        search: Option<&str>,
    ) -> Result<UserPage, ServiceError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let (users, total_pages) = self.store.list_users(page, page_size, search).await?;

        Ok(UserPage { users, total_pages })
    }

    async fn update_profile(
        &self,
        acting: &User,
        id: i32,
        update: ProfileUpdate,
    ) -> Result<User, ServiceError> {
        if acting.id != id {
            return Err(ServiceError::Authorization(
                "You can only edit your own profile".to_string(),
            ));
        }

        let current = self.get(id).await?;

        validation::validate_name(&update.name)?;
        validation::validate_email(&update.email)?;

        let email = validation::normalize_email(&update.email);
        if email != current.email && self.store.email_taken(&email).await? {
            return Err(ServiceError::Validation(
                "Email has already been taken".to_string(),
            ));
        }

        let password_hash = match &update.password {
            Some(password) => {
                validation::validate_password(password)?;
                if update.password_confirmation.as_deref() != Some(password.as_str()) {
                    return Err(ServiceError::Validation(
                        "Password doesn't match confirmation".to_string(),
                    ));
                }
                Some(self.hash_password(password).await?)
            }
            None => None,
        };

        let user = self
            .store
            .update_user_profile(id, update.name.trim(), &email, password_hash.as_deref())
            .await?;

        Ok(user)
    }

    async fn delete(&self, acting: &User, id: i32) -> Result<(), ServiceError> {
        if !acting.is_admin {
            return Err(ServiceError::Authorization(
                "Admin privileges required".to_string(),
            ));
        }
        if acting.id == id {
            return Err(ServiceError::Authorization(
                "Cannot destroy yourself".to_string(),
            ));
        }

        let deleted = self.store.delete_user(id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("User {id}")));
        }

        tracing::info!(user_id = id, "User destroyed");

        Ok(())
    }

    async fn follow(&self, acting: &User, target_id: i32) -> Result<(), ServiceError> {
        if acting.id == target_id {
            return Err(ServiceError::Validation(
                "Cannot follow yourself".to_string(),
            ));
        }

        // Surface a clean not-found instead of a foreign-key failure.
        self.get(target_id).await?;

        self.store.follow(acting.id, target_id).await?;

        Ok(())
    }

    async fn unfollow(&self, acting: &User, target_id: i32) -> Result<(), ServiceError> {
        self.get(target_id).await?;

        self.store.unfollow(acting.id, target_id).await?;

        Ok(())
    }

    async fn is_following(
        &self,
        follower_id: i32,
        followed_id: i32,
    ) -> Result<bool, ServiceError> {
        let following = self.store.is_following(follower_id, followed_id).await?;
        Ok(following)
    }

    async fn following(
        &self,
        user_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<UserPage, ServiceError> {
        self.get(user_id).await?;

        let ids = self.store.followed_ids(user_id).await?;
        let (users, total_pages) = self.store.list_users_by_ids(&ids, page, page_size).await?;

        Ok(UserPage { users, total_pages })
    }

    async fn followers(
        &self,
        user_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<UserPage, ServiceError> {
        self.get(user_id).await?;

        let ids = self.store.follower_ids(user_id).await?;
        let (users, total_pages) = self.store.list_users_by_ids(&ids, page, page_size).await?;

        Ok(UserPage { users, total_pages })
    }
}
