use std::time::Duration;

/// Market API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. When unset the server falls back to the
    /// in-memory store.
    pub database_url: Option<String>,
    /// Upper bound on pooled PostgreSQL connections.
    pub db_pool_size: usize,
    /// HMAC secret used to verify bearer tokens issued by the platform.
    pub jwt_secret: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// How often the gateway pings each connection.
    pub ping_interval: Duration,
    /// How long a connection may go without answering a ping.
    pub ping_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing or
    /// a ping setting is not a positive number of seconds.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_pool_size: parsed_var("DATABASE_POOL_SIZE").unwrap_or(16),
            jwt_secret: required_var("JWT_SECRET"),
            port: parsed_var("PORT").unwrap_or(4003),
            ping_interval: seconds_var("PING_INTERVAL_SECS", 25),
            ping_timeout: seconds_var("PING_TIMEOUT_SECS", 20),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn seconds_var(name: &str, default: u64) -> Duration {
    let raw = std::env::var(name).ok();
    positive_seconds(raw.as_deref(), default).unwrap_or_else(|e| panic!("{name} {e}"))
}

/// Parse a strictly positive number of seconds, using `default` when unset.
fn positive_seconds(raw: Option<&str>, default: u64) -> Result<Duration, String> {
    let secs = match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse::<u64>()
            .map_err(|_| format!("must be a whole number of seconds, got {v:?}"))?,
        None => default,
    };
    if secs == 0 {
        return Err("must be greater than zero".to_string());
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_seconds_fall_back_to_default() {
        assert_eq!(positive_seconds(None, 25), Ok(Duration::from_secs(25)));
        assert_eq!(positive_seconds(Some(""), 20), Ok(Duration::from_secs(20)));
    }

    #[test]
    fn explicit_seconds_are_parsed() {
        assert_eq!(positive_seconds(Some("40"), 25), Ok(Duration::from_secs(40)));
        assert_eq!(positive_seconds(Some(" 5 "), 25), Ok(Duration::from_secs(5)));
    }

    #[test]
    fn zero_or_garbage_seconds_are_rejected() {
        assert!(positive_seconds(Some("0"), 25).is_err());
        assert!(positive_seconds(Some("-3"), 25).is_err());
        assert!(positive_seconds(Some("soon"), 25).is_err());
    }

    #[test]
    #[should_panic(expected = "ZERO_PING_SECS must be greater than zero")]
    fn zero_ping_setting_fails_fast() {
        std::env::set_var("ZERO_PING_SECS", "0");
        seconds_var("ZERO_PING_SECS", 25);
    }
}
