//! Domain service for registration, profiles, and the follow graph.

use async_trait::async_trait;

use super::error::ServiceError;
use crate::db::User;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Profile changes. A `None` password leaves the credential untouched.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total_pages: u64,
}

#[async_trait]
pub trait UserService: Send + Sync {
    /// Validates and creates a new account.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for any rule in the data model:
    /// blank or over-long name, malformed email, taken email (compared
    /// case-insensitively), short password, or mismatched confirmation.
    async fn register(&self, new_user: NewUser) -> Result<User, ServiceError>;

    async fn get(&self, id: i32) -> Result<User, ServiceError>;

    /// Paginated user index with an optional name-substring filter.
    async fn list(
        &self,
        page: u64,
        page_size: u64,
        search: Option<&str>,
    ) -> Result<UserPage, ServiceError>;

    /// Only the user themselves may edit their profile.
    async fn update_profile(
        &self,
        acting: &User,
        id: i32,
        update: ProfileUpdate,
    ) -> Result<User, ServiceError>;

    /// Admin-only; admins cannot delete themselves. Cascades to the user's
    /// microposts and follow edges.
    async fn delete(&self, acting: &User, id: i32) -> Result<(), ServiceError>;

    /// Idempotent: following an already-followed user is a no-op.
    async fn follow(&self, acting: &User, target_id: i32) -> Result<(), ServiceError>;

    /// Removing an absent edge is a no-op.
    async fn unfollow(&self, acting: &User, target_id: i32) -> Result<(), ServiceError>;

    async fn is_following(&self, follower_id: i32, followed_id: i32)
    -> Result<bool, ServiceError>;

    async fn following(
        &self,
        user_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<UserPage, ServiceError>;

    async fn followers(
        &self,
        user_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<UserPage, ServiceError>;
}
