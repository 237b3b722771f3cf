use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::offers;

/// A seller's price quote against a need.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = offers)]
pub struct Offer {
    pub id: String,
    pub need_id: String,
    pub seller_id: String,
    pub price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
