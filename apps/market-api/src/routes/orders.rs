//! Order status endpoint. Status transitions made here are pushed to the
//! order's seller and customer over the socket gateway.

use axum::extract::{Path, State};
use axum::routing::patch;
use axum::{Json, Router};
use chrono::Utc;
use market_common::protocol::OrderStatusChanged;
use market_common::{EventName, OrderStatus, Room};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::auth::principal::Principal;
use crate::error::{ApiError, ApiErrorBody};
use crate::gateway::fanout::Target;
use crate::models::order::Order;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/orders/{order_id}/status", patch(update_order_status))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    /// One of `pending`, `assigned`, `completed`, `cancelled`.
    pub status: String,
}

// ---------------------------------------------------------------------------
// PATCH /api/v1/orders/:order_id/status
// ---------------------------------------------------------------------------

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{order_id}/status",
    tag = "Orders",
    security(("bearer" = [])),
    params(
        ("order_id" = String, Path, description = "Order ID"),
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Order),
        (status = 400, description = "Unknown status", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not the order's seller", body = ApiErrorBody),
        (status = 404, description = "Order not found", body = ApiErrorBody),
    ),
)]
pub async fn update_order_status(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(body): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let status: OrderStatus = body
        .status
        .parse()
        .map_err(|reason: String| ApiError::invalid_field("status", reason))?;

    let order = state
        .store
        .order_by_id(&order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    match &principal {
        Principal::Admin { .. } => {}
        Principal::Seller { id } => {
            let seller = state.store.seller_by_user(id).await?;
            if seller.map(|s| s.id) != Some(order.seller_id.clone()) {
                return Err(ApiError::forbidden("Only the order's seller may update it"));
            }
        }
        Principal::Customer { .. } => {
            return Err(ApiError::forbidden("Only the order's seller may update it"));
        }
    }

    let order = state
        .store
        .update_order_status(&order_id, status)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    let payload = OrderStatusChanged {
        order_id: order.id.clone(),
        order_number: order.order_number.clone(),
        status,
        timestamp: Utc::now(),
    };
    for room in [Room::seller(&order.seller_id), Room::user(&order.customer_id)] {
        state
            .gateway
            .emit(Target::Room(room), EventName::ORDER_STATUS_CHANGED, &payload);
    }

    tracing::info!(
        order_id = %order.id,
        status = %status.as_str(),
        changed_by = %principal.user_id(),
        "order status updated"
    );
    Ok(Json(order))
}
