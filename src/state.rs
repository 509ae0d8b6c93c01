use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, Clock, HabitService, InMemoryHabitService, SystemClock, TokenAuthService,
    TokenIssuer,
};

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub clock: Arc<dyn Clock>,

    pub tokens: TokenIssuer,

    pub auth_service: Arc<dyn AuthService>,

    pub habit_service: Arc<dyn HabitService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(config: Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let store = Store::new();
        store.seed_users(&config.users, &config.security).await?;

        let tokens = TokenIssuer::from_config(&config.security);

        let auth_service = Arc::new(TokenAuthService::new(
            store.clone(),
            tokens.clone(),
            clock.clone(),
        )) as Arc<dyn AuthService>;

        let habit_service = Arc::new(InMemoryHabitService::new(store.clone(), clock.clone()))
            as Arc<dyn HabitService>;

        info!(
            users = store.user_count().await,
            token_expiry_minutes = config.security.token_expiry_minutes,
            "State initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            clock,
            tokens,
            auth_service,
            habit_service,
        })
    }
}
