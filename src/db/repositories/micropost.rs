use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{microposts, prelude::*};

pub struct MicropostRepository {
    conn: DatabaseConnection,
}

impl MicropostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: i32, content: &str) -> Result<microposts::Model> {
        let active = microposts::ActiveModel {
            user_id: Set(user_id),
            content: Set(content.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert micropost")?;

        Ok(model)
    }

    pub async fn get(&self, id: i32) -> Result<Option<microposts::Model>> {
        let post = Microposts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query micropost by ID")?;

        Ok(post)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Microposts::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete micropost")?;

        Ok(result.rows_affected > 0)
    }

    /// One user's posts, newest first. This is also the export order for a
    /// user's post history.
    pub async fn for_user(
        &self,
        user_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<microposts::Model>, u64)> {
        let paginator = Microposts::find()
            .filter(microposts::Column::UserId.eq(user_id))
            .order_by_desc(microposts::Column::CreatedAt)
            .order_by_desc(microposts::Column::Id)
            .paginate(&self.conn, page_size);

        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        let count = Microposts::find()
            .filter(microposts::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count microposts")?;

        Ok(count)
    }

    /// Posts owned by any id in `owner_ids`, newest first with id as the
    /// tie-breaker, optionally filtered by a content substring.
    ///
    /// The caller supplies the full owner set up front (the user plus their
    /// followed ids), so this stays a single `IN` query regardless of how
    /// many users are followed. The substring match uses SQL `LIKE`, which
    /// is case-insensitive for ASCII under SQLite's default collation.
    pub async fn feed(
        &self,
        owner_ids: &[i32],
        content_filter: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<microposts::Model>, u64)> {
        if owner_ids.is_empty() {
            return Ok((Vec::new(), 0));
        }

        let mut query = Microposts::find()
            .filter(microposts::Column::UserId.is_in(owner_ids.iter().copied()))
            .order_by_desc(microposts::Column::CreatedAt)
            .order_by_desc(microposts::Column::Id);

        if let Some(word) = content_filter {
            query = query.filter(microposts::Column::Content.contains(word));
        }

        let paginator = query.paginate(&self.conn, page_size);
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }
}
