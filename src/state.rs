use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, FeedService, SeaOrmAuthService, SeaOrmFeedService, SeaOrmUserService, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub feed_service: Arc<dyn FeedService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let security = config.security.clone();
        let config = Arc::new(RwLock::new(config));

        let auth_service =
            Arc::new(SeaOrmAuthService::new(store.clone())) as Arc<dyn AuthService>;

        let user_service = Arc::new(SeaOrmUserService::new(store.clone(), security))
            as Arc<dyn UserService>;

        let feed_service =
            Arc::new(SeaOrmFeedService::new(store.clone())) as Arc<dyn FeedService>;

        Ok(Self {
            config,
            store,
            auth_service,
            user_service,
            feed_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
