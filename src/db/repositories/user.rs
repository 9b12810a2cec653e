use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{microposts, prelude::*, relationships, users};

/// User data returned from the repository (without the password hash or
/// remember digest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            is_admin: model.is_admin,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new user. `email` must already be normalized (lower-cased);
    /// `password_hash` must already be an Argon2id PHC string.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            remember_digest: Set(None),
            is_admin: Set(is_admin),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Lookup by normalized email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        let count = Users::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("Failed to count users by email")?;

        Ok(count > 0)
    }

    /// Find the user whose stored remember digest matches `digest`.
    pub async fn get_by_remember_digest(&self, digest: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::RememberDigest.eq(digest))
            .one(&self.conn)
            .await
            .context("Failed to query user by remember digest")?;

        Ok(user.map(User::from))
    }

    /// Verify a password for the user with the given (normalized) email.
    /// Note: this uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Overwrite the remember digest. `None` clears it, which invalidates
    /// every previously issued token for this user.
    pub async fn set_remember_digest(&self, id: i32, digest: Option<&str>) -> Result<()> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for digest update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.remember_digest = Set(digest.map(ToString::to_string));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Update profile fields. `email` must already be normalized; a `None`
    /// password hash leaves the stored credential untouched.
    pub async fn update_profile(
        &self,
        id: i32,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
    ) -> Result<User> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.name = Set(name.to_string());
        active.email = Set(email.to_string());
        if let Some(hash) = password_hash {
            active.password_hash = Set(hash.to_string());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(User::from(model))
    }

    /// Delete a user together with their microposts and every follow edge
    /// touching them, in one transaction. Returns false if the id is unknown.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let found = Users::find_by_id(id).one(&txn).await?.is_some();
        if !found {
            txn.rollback().await?;
            return Ok(false);
        }

        Microposts::delete_many()
            .filter(microposts::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        Relationships::delete_many()
            .filter(
                sea_orm::Condition::any()
                    .add(relationships::Column::FollowerId.eq(id))
                    .add(relationships::Column::FollowedId.eq(id)),
            )
            .exec(&txn)
            .await?;

        Users::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(true)
    }

    /// Paginated user index, optionally filtered by a name substring.
    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
        name_filter: Option<&str>,
    ) -> Result<(Vec<User>, u64)> {
        let mut query = Users::find().order_by_asc(users::Column::Id);

        if let Some(word) = name_filter {
            query = query.filter(users::Column::Name.contains(word));
        }

        let paginator = query.paginate(&self.conn, page_size);
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items.into_iter().map(User::from).collect(), total_pages))
    }

    /// Paginated listing of the users whose ids are in `ids`, in id order.
    pub async fn list_by_ids(
        &self,
        ids: &[i32],
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<User>, u64)> {
        if ids.is_empty() {
            return Ok((Vec::new(), 0));
        }

        let paginator = Users::find()
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(users::Column::Id)
            .paginate(&self.conn, page_size);

        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items.into_iter().map(User::from).collect(), total_pages))
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the library defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
