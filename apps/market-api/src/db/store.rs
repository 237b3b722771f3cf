use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use market_common::OrderStatus;

use crate::db::pool::DbPool;
use crate::db::schema::{needs, offers, orders, sellers};
use crate::error::ApiError;
use crate::models::need::Need;
use crate::models::offer::Offer;
use crate::models::order::Order;
use crate::models::seller::Seller;

/// Document lookups the realtime layer needs from the marketplace store.
///
/// Each lookup is a find-by-key returning `Ok(None)` when the document does
/// not exist. Writes are plain load-mutate-save with no concurrency token.
#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn seller_by_user(&self, user_id: &str) -> Result<Option<Seller>, ApiError>;
    async fn seller_by_id(&self, seller_id: &str) -> Result<Option<Seller>, ApiError>;
    async fn set_seller_online(&self, seller_id: &str, is_online: bool) -> Result<(), ApiError>;
    /// Sellers that are both online and approved.
    async fn online_approved_sellers(&self) -> Result<Vec<Seller>, ApiError>;
    async fn need_by_id(&self, need_id: &str) -> Result<Option<Need>, ApiError>;
    async fn offer_by_id(&self, offer_id: &str) -> Result<Option<Offer>, ApiError>;
    /// Every offer on `need_id` except `offer_id`, oldest first.
    async fn offers_for_need_except(
        &self,
        need_id: &str,
        offer_id: &str,
    ) -> Result<Vec<Offer>, ApiError>;
    async fn order_by_id(&self, order_id: &str) -> Result<Option<Order>, ApiError>;
    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, ApiError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL implementation
// ---------------------------------------------------------------------------

pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MarketStore for PgStore {
    async fn seller_by_user(&self, user_id: &str) -> Result<Option<Seller>, ApiError> {
        let mut conn = self.pool.get().await?;
        let seller = diesel_async::RunQueryDsl::first(
            sellers::table
                .filter(sellers::user_id.eq(user_id))
                .select(Seller::as_select()),
            &mut conn,
        )
        .await
        .optional()?;
        Ok(seller)
    }

    async fn seller_by_id(&self, seller_id: &str) -> Result<Option<Seller>, ApiError> {
        let mut conn = self.pool.get().await?;
        let seller = diesel_async::RunQueryDsl::get_result(
            sellers::table.find(seller_id).select(Seller::as_select()),
            &mut conn,
        )
        .await
        .optional()?;
        Ok(seller)
    }

    async fn set_seller_online(&self, seller_id: &str, is_online: bool) -> Result<(), ApiError> {
        let mut conn = self.pool.get().await?;
        diesel_async::RunQueryDsl::execute(
            diesel::update(sellers::table.find(seller_id)).set((
                sellers::is_online.eq(is_online),
                sellers::updated_at.eq(Utc::now()),
            )),
            &mut conn,
        )
        .await?;
        Ok(())
    }

    async fn online_approved_sellers(&self) -> Result<Vec<Seller>, ApiError> {
        let mut conn = self.pool.get().await?;
        let rows = diesel_async::RunQueryDsl::load(
            sellers::table
                .filter(sellers::is_online.eq(true))
                .filter(sellers::is_approved.eq(true))
                .select(Seller::as_select()),
            &mut conn,
        )
        .await?;
        Ok(rows)
    }

    async fn need_by_id(&self, need_id: &str) -> Result<Option<Need>, ApiError> {
        let mut conn = self.pool.get().await?;
        let need = diesel_async::RunQueryDsl::get_result(
            needs::table.find(need_id).select(Need::as_select()),
            &mut conn,
        )
        .await
        .optional()?;
        Ok(need)
    }

    async fn offer_by_id(&self, offer_id: &str) -> Result<Option<Offer>, ApiError> {
        let mut conn = self.pool.get().await?;
        let offer = diesel_async::RunQueryDsl::get_result(
            offers::table.find(offer_id).select(Offer::as_select()),
            &mut conn,
        )
        .await
        .optional()?;
        Ok(offer)
    }

    async fn offers_for_need_except(
        &self,
        need_id: &str,
        offer_id: &str,
    ) -> Result<Vec<Offer>, ApiError> {
        let mut conn = self.pool.get().await?;
        let rows = diesel_async::RunQueryDsl::load(
            offers::table
                .filter(offers::need_id.eq(need_id))
                .filter(offers::id.ne(offer_id))
                .order(offers::created_at.asc())
                .select(Offer::as_select()),
            &mut conn,
        )
        .await?;
        Ok(rows)
    }

    async fn order_by_id(&self, order_id: &str) -> Result<Option<Order>, ApiError> {
        let mut conn = self.pool.get().await?;
        let order = diesel_async::RunQueryDsl::get_result(
            orders::table.find(order_id).select(Order::as_select()),
            &mut conn,
        )
        .await
        .optional()?;
        Ok(order)
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, ApiError> {
        let mut conn = self.pool.get().await?;
        let order = diesel_async::RunQueryDsl::get_result(
            diesel::update(orders::table.find(order_id))
                .set((
                    orders::status.eq(status.as_str()),
                    orders::updated_at.eq(Utc::now()),
                ))
                .returning(Order::as_returning()),
            &mut conn,
        )
        .await
        .optional()?;
        Ok(order)
    }
}
