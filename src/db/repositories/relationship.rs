use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
};

use crate::entities::{prelude::*, relationships};

pub struct RelationshipRepository {
    conn: DatabaseConnection,
}

impl RelationshipRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a follow edge. Idempotent: the unique index on
    /// (`follower_id`, `followed_id`) turns a repeat follow into a no-op.
    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<()> {
        let active = relationships::ActiveModel {
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        Relationships::insert(active)
            .on_conflict(
                OnConflict::columns([
                    relationships::Column::FollowerId,
                    relationships::Column::FollowedId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert relationship")?;

        Ok(())
    }

    /// Remove the edge if present. Returns whether an edge was deleted.
    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let result = Relationships::delete_many()
            .filter(relationships::Column::FollowerId.eq(follower_id))
            .filter(relationships::Column::FollowedId.eq(followed_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete relationship")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let count = Relationships::find()
            .filter(relationships::Column::FollowerId.eq(follower_id))
            .filter(relationships::Column::FollowedId.eq(followed_id))
            .count(&self.conn)
            .await
            .context("Failed to query relationship")?;

        Ok(count > 0)
    }

    /// Every id this follower follows.
    pub async fn followed_ids(&self, follower_id: i32) -> Result<Vec<i32>> {
        let ids = Relationships::find()
            .select_only()
            .column(relationships::Column::FollowedId)
            .filter(relationships::Column::FollowerId.eq(follower_id))
            .into_tuple::<i32>()
            .all(&self.conn)
            .await
            .context("Failed to query followed ids")?;

        Ok(ids)
    }

    /// Every id following this user.
    pub async fn follower_ids(&self, followed_id: i32) -> Result<Vec<i32>> {
        let ids = Relationships::find()
            .select_only()
            .column(relationships::Column::FollowerId)
            .filter(relationships::Column::FollowedId.eq(followed_id))
            .into_tuple::<i32>()
            .all(&self.conn)
            .await
            .context("Failed to query follower ids")?;

        Ok(ids)
    }

    pub async fn following_count(&self, follower_id: i32) -> Result<u64> {
        let count = Relationships::find()
            .filter(relationships::Column::FollowerId.eq(follower_id))
            .count(&self.conn)
            .await
            .context("Failed to count following")?;

        Ok(count)
    }

    pub async fn follower_count(&self, followed_id: i32) -> Result<u64> {
        let count = Relationships::find()
            .filter(relationships::Column::FollowedId.eq(followed_id))
            .count(&self.conn)
            .await
            .context("Failed to count followers")?;

        Ok(count)
    }
}
