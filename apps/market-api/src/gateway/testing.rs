//! Fixtures shared by the gateway unit tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use market_common::OrderStatus;

use crate::config::Config;
use crate::db::memory::MemoryStore;
use crate::db::store::MarketStore;
use crate::error::ApiError;
use crate::models::need::Need;
use crate::models::offer::Offer;
use crate::models::order::Order;
use crate::models::seller::Seller;
use crate::AppState;

pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (AppState::new(test_config(), store.clone()), store)
}

/// State whose store fails every call.
pub fn unavailable_state() -> AppState {
    AppState::new(test_config(), Arc::new(UnavailableStore))
}

fn test_config() -> Config {
    Config {
        database_url: None,
        db_pool_size: 1,
        jwt_secret: "unit-test-secret".to_string(),
        port: 0,
        ping_interval: Duration::from_secs(25),
        ping_timeout: Duration::from_secs(20),
    }
}

pub struct UnavailableStore;

fn unavailable<T>() -> Result<T, ApiError> {
    Err(ApiError::internal("store unavailable"))
}

#[async_trait]
impl MarketStore for UnavailableStore {
    async fn seller_by_user(&self, _user_id: &str) -> Result<Option<Seller>, ApiError> {
        unavailable()
    }
    async fn seller_by_id(&self, _seller_id: &str) -> Result<Option<Seller>, ApiError> {
        unavailable()
    }
    async fn set_seller_online(&self, _seller_id: &str, _is_online: bool) -> Result<(), ApiError> {
        unavailable()
    }
    async fn online_approved_sellers(&self) -> Result<Vec<Seller>, ApiError> {
        unavailable()
    }
    async fn need_by_id(&self, _need_id: &str) -> Result<Option<Need>, ApiError> {
        unavailable()
    }
    async fn offer_by_id(&self, _offer_id: &str) -> Result<Option<Offer>, ApiError> {
        unavailable()
    }
    async fn offers_for_need_except(
        &self,
        _need_id: &str,
        _offer_id: &str,
    ) -> Result<Vec<Offer>, ApiError> {
        unavailable()
    }
    async fn order_by_id(&self, _order_id: &str) -> Result<Option<Order>, ApiError> {
        unavailable()
    }
    async fn update_order_status(
        &self,
        _order_id: &str,
        _status: OrderStatus,
    ) -> Result<Option<Order>, ApiError> {
        unavailable()
    }
}

pub fn seller(id: &str, user_id: &str, is_online: bool, is_approved: bool) -> Seller {
    Seller {
        id: id.to_string(),
        user_id: user_id.to_string(),
        store_name: format!("{id} store"),
        is_online,
        is_approved,
        updated_at: Utc::now(),
    }
}

pub fn need(id: &str, customer_id: &str) -> Need {
    Need {
        id: id.to_string(),
        customer_id: customer_id.to_string(),
        product_id: "prd_mtn_1gb".to_string(),
        status: "open".to_string(),
        created_at: Utc::now(),
    }
}

pub fn offer(id: &str, need_id: &str, seller_id: &str, price: f64) -> Offer {
    Offer {
        id: id.to_string(),
        need_id: need_id.to_string(),
        seller_id: seller_id.to_string(),
        price,
        status: "pending".to_string(),
        created_at: Utc::now(),
    }
}

pub fn order(id: &str, customer_id: &str, seller_id: &str) -> Order {
    Order {
        id: id.to_string(),
        order_number: format!("ORD-{id}"),
        customer_id: customer_id.to_string(),
        seller_id: seller_id.to_string(),
        product_id: "prd_mtn_1gb".to_string(),
        total_amount: 120.0,
        status: "pending".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
