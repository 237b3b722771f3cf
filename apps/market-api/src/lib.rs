pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;

use std::sync::Arc;

use auth::tokens::TokenVerifier;
use config::Config;
use db::store::MarketStore;
use gateway::Gateway;

/// Shared application state available to all route and socket handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketStore>,
    pub tokens: TokenVerifier,
    pub config: Arc<Config>,
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn MarketStore>) -> Self {
        Self {
            store,
            tokens: TokenVerifier::new(&config.jwt_secret),
            config: Arc::new(config),
            gateway: Arc::new(Gateway::new()),
        }
    }
}
