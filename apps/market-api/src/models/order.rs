use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::orders;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub customer_id: String,
    pub seller_id: String,
    pub product_id: String,
    pub total_amount: f64,
    /// One of `pending`, `assigned`, `completed`, `cancelled`.
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
