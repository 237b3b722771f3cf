use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::sellers;

/// A seller profile. Only the fields the gateway reads or writes are mapped.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = sellers)]
pub struct Seller {
    pub id: String,
    pub user_id: String,
    pub store_name: String,
    pub is_online: bool,
    pub is_approved: bool,
    pub updated_at: DateTime<Utc>,
}
