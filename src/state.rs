use std::sync::Arc;

use crate::config::Config;
use crate::db::Stores;
use crate::live::{LiveSessionManager, StreamRegistry};
use crate::services::AccessService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: Stores,
    pub access: AccessService,
    pub registry: StreamRegistry,
    pub sessions: LiveSessionManager,
}

impl AppState {
    pub fn new(config: Arc<Config>, stores: Stores, redis: Option<redis::Client>) -> Self {
        let registry = StreamRegistry::new();
        let access = AccessService::new(stores.clone());
        let sessions = LiveSessionManager::new(
            registry.clone(),
            stores.clone(),
            redis,
            std::time::Duration::from_secs(config.leaderboard_poll_secs),
            config.chat_history_limit,
        );

        Self {
            config,
            stores,
            access,
            registry,
            sessions,
        }
    }
}
