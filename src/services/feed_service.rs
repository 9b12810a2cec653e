//! Domain service for microposts and the aggregated feed.

use async_trait::async_trait;

use super::error::ServiceError;
use crate::db::User;
use crate::entities::microposts;

#[derive(Debug, Clone)]
pub struct FeedPage {
    pub posts: Vec<microposts::Model>,
    pub total_pages: u64,
}

#[async_trait]
pub trait FeedService: Send + Sync {
    /// Validates and creates a micropost owned by `acting`.
    async fn create_post(
        &self,
        acting: &User,
        content: &str,
    ) -> Result<microposts::Model, ServiceError>;

    /// Only the owner may delete a post.
    async fn delete_post(&self, acting: &User, post_id: i32) -> Result<(), ServiceError>;

    /// One user's posts, newest first. Also the export order for a user's
    /// post history.
    async fn posts_for_user(
        &self,
        user_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<FeedPage, ServiceError>;

    /// The aggregated feed: the user's own posts plus posts from everyone
    /// they follow, newest first (ties broken by id), optionally filtered by
    /// a content substring. Pagination happens in the store; the full result
    /// set is never materialized.
    async fn feed(
        &self,
        user_id: i32,
        filter: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<FeedPage, ServiceError>;
}
