//! In-memory `MarketStore` for local development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use market_common::OrderStatus;
use parking_lot::RwLock;

use crate::db::store::MarketStore;
use crate::error::ApiError;
use crate::models::need::Need;
use crate::models::offer::Offer;
use crate::models::order::Order;
use crate::models::seller::Seller;

#[derive(Default)]
struct Documents {
    sellers: HashMap<String, Seller>,
    needs: HashMap<String, Need>,
    /// Kept in insertion order so "other offers" come back oldest first.
    offers: Vec<Offer>,
    orders: HashMap<String, Order>,
}

#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<Documents>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_seller(&self, seller: Seller) {
        self.docs.write().sellers.insert(seller.id.clone(), seller);
    }

    pub fn insert_need(&self, need: Need) {
        self.docs.write().needs.insert(need.id.clone(), need);
    }

    pub fn insert_offer(&self, offer: Offer) {
        let mut docs = self.docs.write();
        docs.offers.retain(|o| o.id != offer.id);
        docs.offers.push(offer);
    }

    pub fn insert_order(&self, order: Order) {
        self.docs.write().orders.insert(order.id.clone(), order);
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn seller_by_user(&self, user_id: &str) -> Result<Option<Seller>, ApiError> {
        Ok(self
            .docs
            .read()
            .sellers
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn seller_by_id(&self, seller_id: &str) -> Result<Option<Seller>, ApiError> {
        Ok(self.docs.read().sellers.get(seller_id).cloned())
    }

    async fn set_seller_online(&self, seller_id: &str, is_online: bool) -> Result<(), ApiError> {
        if let Some(seller) = self.docs.write().sellers.get_mut(seller_id) {
            seller.is_online = is_online;
            seller.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn online_approved_sellers(&self) -> Result<Vec<Seller>, ApiError> {
        Ok(self
            .docs
            .read()
            .sellers
            .values()
            .filter(|s| s.is_online && s.is_approved)
            .cloned()
            .collect())
    }

    async fn need_by_id(&self, need_id: &str) -> Result<Option<Need>, ApiError> {
        Ok(self.docs.read().needs.get(need_id).cloned())
    }

    async fn offer_by_id(&self, offer_id: &str) -> Result<Option<Offer>, ApiError> {
        Ok(self
            .docs
            .read()
            .offers
            .iter()
            .find(|o| o.id == offer_id)
            .cloned())
    }

    async fn offers_for_need_except(
        &self,
        need_id: &str,
        offer_id: &str,
    ) -> Result<Vec<Offer>, ApiError> {
        Ok(self
            .docs
            .read()
            .offers
            .iter()
            .filter(|o| o.need_id == need_id && o.id != offer_id)
            .cloned()
            .collect())
    }

    async fn order_by_id(&self, order_id: &str) -> Result<Option<Order>, ApiError> {
        Ok(self.docs.read().orders.get(order_id).cloned())
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, ApiError> {
        let mut docs = self.docs.write();
        let Some(order) = docs.orders.get_mut(order_id) else {
            return Ok(None);
        };
        order.status = status.as_str().to_string();
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }
}
