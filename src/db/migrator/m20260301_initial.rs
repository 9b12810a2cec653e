use crate::entities::prelude::*;
use crate::entities::{microposts, relationships};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Microposts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Relationships)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Feed queries scan by owner and order by recency.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_microposts_user_created")
                    .table(Microposts)
                    .col(microposts::Column::UserId)
                    .col(microposts::Column::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // One edge per (follower, followed) pair; follow is idempotent.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_relationships_follower_followed")
                    .table(Relationships)
                    .col(relationships::Column::FollowerId)
                    .col(relationships::Column::FollowedId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_relationships_followed")
                    .table(Relationships)
                    .col(relationships::Column::FollowedId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Relationships).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Microposts).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
