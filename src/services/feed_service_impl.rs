//! `SeaORM` implementation of the `FeedService` trait.

use async_trait::async_trait;

use crate::db::{Store, User};
use crate::entities::microposts;
use crate::services::error::ServiceError;
use crate::services::feed_service::{FeedPage, FeedService};
use crate::services::validation;

pub struct SeaOrmFeedService {
    store: Store,
}

impl SeaOrmFeedService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FeedService for SeaOrmFeedService {
    async fn create_post(
        &self,
        acting: &User,
        content: &str,
    ) -> Result<microposts::Model, ServiceError> {
        validation::validate_content(content)?;

        let post = self.store.create_micropost(acting.id, content).await?;

        Ok(post)
    }

    async fn delete_post(&self, acting: &User, post_id: i32) -> Result<(), ServiceError> {
        let post = self
            .store
            .get_micropost(post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Micropost {post_id}")))?;

        if post.user_id != acting.id {
            return Err(ServiceError::Authorization(
                "You can only delete your own microposts".to_string(),
            ));
        }

        self.store.delete_micropost(post_id).await?;

        Ok(())
    }

    async fn posts_for_user(
        &self,
        user_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<FeedPage, ServiceError> {
        let (posts, total_pages) = self
            .store
            .microposts_for_user(user_id, page, page_size)
            .await?;

        Ok(FeedPage { posts, total_pages })
    }

    async fn feed(
        &self,
        user_id: i32,
        filter: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<FeedPage, ServiceError> {
        // One round-trip for the followed set, one for the page itself; the
        // feed predicate is a single IN query however many users are followed.
        let mut owner_ids = self.store.followed_ids(user_id).await?;
        owner_ids.push(user_id);

        let filter = filter.map(str::trim).filter(|f| !f.is_empty());

        let (posts, total_pages) = self
            .store
            .feed_microposts(&owner_ids, filter, page, page_size)
            .await?;

        Ok(FeedPage { posts, total_pages })
    }
}
