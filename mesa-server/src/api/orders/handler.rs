//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::OrderStatus;
use shared::request::CreateOrderRequest;
use shared::response::{OrderDetailResponse, OrderResponse, OrdersResponse};

use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::orders::{OrderIngress, OrderStore, StatusEngine};
use crate::utils::{AppError, AppResult};

/// POST /api/orders - checkout
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderResponse>)> {
    let ingress = OrderIngress::new(state.orders.clone());
    let order = ingress.submit(Some(&user), payload).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse { order })))
}

/// GET /api/orders - own orders, newest first
pub async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<OrdersResponse>> {
    let orders = state.orders.list_for_owner(&user.id).await?;
    Ok(Json(OrdersResponse { orders }))
}

/// GET /api/orders/{id} - single order, owner or operator only
pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<OrderDetailResponse>> {
    let detail = state
        .orders
        .find_detail(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;

    // Customers only see their own orders; don't reveal foreign ids
    if !user.is_elevated() && detail.order.user_id.as_deref() != Some(user.id.as_str()) {
        return Err(AppError::not_found(format!("Order {id}")));
    }

    Ok(Json(OrderDetailResponse { order: detail }))
}

/// Status body with the value kept as a string, so an unknown status is a
/// 400 validation failure rather than a generic deserialization rejection
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
}

/// PATCH /api/orders/{id}/status - operator advances the status
pub async fn update_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusBody>,
) -> AppResult<Json<OrderResponse>> {
    let status: OrderStatus = payload
        .status
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid status: {}", payload.status)))?;

    let engine = StatusEngine::new(state.orders.clone());
    let order = engine.transition(&user, &id, status).await?;
    Ok(Json(OrderResponse { order }))
}

/// GET /api/admin/orders - every order (operator view)
pub async fn list_all(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<OrdersResponse>> {
    if !user.is_elevated() {
        return Err(AppError::forbidden("Operator role required"));
    }
    let orders = state.orders.list_all().await?;
    Ok(Json(OrdersResponse { orders }))
}
