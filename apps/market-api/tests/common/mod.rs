#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use market_common::OrderStatus;

use market_api::auth::principal::Principal;
use market_api::config::Config;
use market_api::db::{MarketStore, MemoryStore};
use market_api::error::ApiError;
use market_api::models::need::Need;
use market_api::models::offer::Offer;
use market_api::models::order::Order;
use market_api::models::seller::Seller;
use market_api::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config(ping_interval: Duration, ping_timeout: Duration) -> Config {
    Config {
        database_url: None,
        db_pool_size: 1,
        jwt_secret: TEST_SECRET.to_string(),
        port: 0,
        ping_interval,
        ping_timeout,
    }
}

/// Build a test AppState backed by the in-memory store.
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    test_state_with(test_config(Duration::from_secs(25), Duration::from_secs(20)))
}

pub fn test_state_with(config: Config) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (AppState::new(config, store.clone()), store)
}

/// Build the full application router wired to the test state.
pub fn test_app(state: &AppState) -> Router {
    market_api::routes::router().with_state(state.clone())
}

/// Start an actual TCP server for WebSocket testing. The server runs in the
/// background for the rest of the test.
pub async fn start_ws_server(state: &AppState) -> SocketAddr {
    let app = test_app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Mint a valid token for `principal`.
pub fn token_for(state: &AppState, principal: &Principal) -> String {
    state
        .tokens
        .mint(principal, chrono::Duration::minutes(5))
        .expect("mint test token")
}

pub fn customer(id: &str) -> Principal {
    Principal::Customer { id: id.to_string() }
}

pub fn seller_principal(user_id: &str) -> Principal {
    Principal::Seller {
        id: user_id.to_string(),
    }
}

pub fn admin(id: &str) -> Principal {
    Principal::Admin { id: id.to_string() }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

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
        product_id: "prd_airtime_500".to_string(),
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
        product_id: "prd_airtime_500".to_string(),
        total_amount: 500.0,
        status: "pending".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Store that loses seller lookups
// ---------------------------------------------------------------------------

/// Delegates to a `MemoryStore` but fails every seller-by-user lookup.
pub struct SellerLookupDown {
    pub inner: MemoryStore,
}

#[async_trait]
impl MarketStore for SellerLookupDown {
    async fn seller_by_user(&self, _user_id: &str) -> Result<Option<Seller>, ApiError> {
        Err(ApiError::internal("seller lookup unavailable"))
    }
    async fn seller_by_id(&self, seller_id: &str) -> Result<Option<Seller>, ApiError> {
        self.inner.seller_by_id(seller_id).await
    }
    async fn set_seller_online(&self, seller_id: &str, is_online: bool) -> Result<(), ApiError> {
        self.inner.set_seller_online(seller_id, is_online).await
    }
    async fn online_approved_sellers(&self) -> Result<Vec<Seller>, ApiError> {
        self.inner.online_approved_sellers().await
    }
    async fn need_by_id(&self, need_id: &str) -> Result<Option<Need>, ApiError> {
        self.inner.need_by_id(need_id).await
    }
    async fn offer_by_id(&self, offer_id: &str) -> Result<Option<Offer>, ApiError> {
        self.inner.offer_by_id(offer_id).await
    }
    async fn offers_for_need_except(
        &self,
        need_id: &str,
        offer_id: &str,
    ) -> Result<Vec<Offer>, ApiError> {
        self.inner.offers_for_need_except(need_id, offer_id).await
    }
    async fn order_by_id(&self, order_id: &str) -> Result<Option<Order>, ApiError> {
        self.inner.order_by_id(order_id).await
    }
    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, ApiError> {
        self.inner.update_order_status(order_id, status).await
    }
}

/// Build a test AppState over an arbitrary store.
pub fn test_state_over(store: Arc<dyn MarketStore>) -> AppState {
    AppState::new(
        test_config(Duration::from_secs(25), Duration::from_secs(20)),
        store,
    )
}
