use ulid::Ulid;

/// Prefix of socket connection ids.
pub const CONNECTION_PREFIX: &str = "conn";

/// `{prefix}_{ulid}`. ULIDs sort by creation time, so ids do too.
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{prefix}_{}", Ulid::new())
}

/// A fresh id for one socket connection.
///
/// ```
/// let id = market_common::id::connection_id();
/// assert!(id.starts_with("conn_"));
/// ```
pub fn connection_id() -> String {
    prefixed_ulid(CONNECTION_PREFIX)
}
