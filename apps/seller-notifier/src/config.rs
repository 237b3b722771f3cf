use std::path::PathBuf;
use std::time::Duration;

use crate::notifier::Permission;

/// Seller notifier configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gateway socket URL, e.g. `ws://localhost:4003/socket`.
    pub ws_url: String,
    /// Bearer token of the seller this client runs for.
    pub token: String,
    /// Where reminder markers are persisted. In-memory when unset.
    pub store_path: Option<PathBuf>,
    /// Whether desktop notifications were granted.
    pub desktop_notifications: Permission,
    pub tick_interval: Duration,
    pub reconnect_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            ws_url: std::env::var("MARKET_WS_URL")
                .unwrap_or_else(|_| "ws://localhost:4003/socket".to_string()),
            token: std::env::var("MARKET_TOKEN").expect("MARKET_TOKEN env var is required"),
            store_path: std::env::var("REMINDER_STORE_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            desktop_notifications: Permission::from_setting(
                std::env::var("DESKTOP_NOTIFICATIONS").ok().as_deref(),
            ),
            tick_interval: Duration::from_secs(60),
            reconnect_delay: Duration::from_secs(5),
        }
    }

    /// Socket URL with the token attached as the `token` query parameter.
    pub fn socket_url(&self) -> String {
        let sep = if self.ws_url.contains('?') { '&' } else { '?' };
        format!("{}{sep}token={}", self.ws_url, self.token)
    }
}
