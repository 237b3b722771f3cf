use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::needs;

/// A customer's request for price quotes on a product.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = needs)]
pub struct Need {
    pub id: String,
    pub customer_id: String,
    pub product_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
