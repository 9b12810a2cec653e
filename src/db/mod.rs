use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::microposts;

pub mod migrator;
pub mod repositories;

pub use repositories::user::{User, hash_password};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn micropost_repo(&self) -> repositories::micropost::MicropostRepository {
        repositories::micropost::MicropostRepository::new(self.conn.clone())
    }

    fn relationship_repo(&self) -> repositories::relationship::RelationshipRepository {
        repositories::relationship::RelationshipRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User> {
        self.user_repo()
            .create(name, email, password_hash, is_admin)
            .await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        self.user_repo().email_taken(email).await
    }

    pub async fn get_user_by_remember_digest(&self, digest: &str) -> Result<Option<User>> {
        self.user_repo().get_by_remember_digest(digest).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn set_remember_digest(&self, user_id: i32, digest: Option<&str>) -> Result<()> {
        self.user_repo().set_remember_digest(user_id, digest).await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
    ) -> Result<User> {
        self.user_repo()
            .update_profile(id, name, email, password_hash)
            .await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn list_users(
        &self,
        page: u64,
        page_size: u64,
        name_filter: Option<&str>,
    ) -> Result<(Vec<User>, u64)> {
        self.user_repo().list(page, page_size, name_filter).await
    }

    pub async fn list_users_by_ids(
        &self,
        ids: &[i32],
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<User>, u64)> {
        self.user_repo().list_by_ids(ids, page, page_size).await
    }

    // ========== Microposts ==========

    pub async fn create_micropost(&self, user_id: i32, content: &str) -> Result<microposts::Model> {
        self.micropost_repo().create(user_id, content).await
    }

    pub async fn get_micropost(&self, id: i32) -> Result<Option<microposts::Model>> {
        self.micropost_repo().get(id).await
    }

    pub async fn delete_micropost(&self, id: i32) -> Result<bool> {
        self.micropost_repo().delete(id).await
    }

    pub async fn microposts_for_user(
        &self,
        user_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<microposts::Model>, u64)> {
        self.micropost_repo()
            .for_user(user_id, page, page_size)
            .await
    }

    pub async fn micropost_count(&self, user_id: i32) -> Result<u64> {
        self.micropost_repo().count_for_user(user_id).await
    }

    pub async fn feed_microposts(
        &self,
        owner_ids: &[i32],
        content_filter: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<microposts::Model>, u64)> {
        self.micropost_repo()
            .feed(owner_ids, content_filter, page, page_size)
            .await
    }

    // ========== Relationships ==========

    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<()> {
        self.relationship_repo()
            .follow(follower_id, followed_id)
            .await
    }

    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        self.relationship_repo()
            .unfollow(follower_id, followed_id)
            .await
    }

    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        self.relationship_repo()
            .is_following(follower_id, followed_id)
            .await
    }

    pub async fn followed_ids(&self, follower_id: i32) -> Result<Vec<i32>> {
        self.relationship_repo().followed_ids(follower_id).await
    }

    pub async fn follower_ids(&self, followed_id: i32) -> Result<Vec<i32>> {
        self.relationship_repo().follower_ids(followed_id).await
    }

    pub async fn following_count(&self, follower_id: i32) -> Result<u64> {
        self.relationship_repo().following_count(follower_id).await
    }

    pub async fn follower_count(&self, followed_id: i32) -> Result<u64> {
        self.relationship_repo().follower_count(followed_id).await
    }

    // ========== Helpers ==========

    /// Hash a password with this deployment's Argon2 parameters, off the
    /// async runtime.
    pub async fn hash_password_with_config(
        &self,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<String> {
        let password = password.to_string();
        let config = config.clone();
        tokio::task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .map_err(|e| anyhow::anyhow!("Password hashing task panicked: {e}"))?
    }
}
