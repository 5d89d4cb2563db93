use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::domain::{OrderStatus, PaymentStatus, Role};
use crate::order_actor::PlaceOrder;
use super::{ApiError, ApiJson, AppState, AuthUser};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/my-orders", get(get_my_orders))
        .route("/seller-orders", get(get_seller_orders))
        .route("/{id}", get(get_order))
        .route("/{id}/status", put(update_status))
        .route("/{id}/payment", put(update_payment))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    status: OrderStatus,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    #[serde(default)]
    transaction_id: Option<String>,
    status: PaymentStatus,
}

#[instrument(skip_all, fields(buyer = %user.0.id))]
async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<PlaceOrder>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.orders.create_order(user.0.id.clone(), request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Order placed successfully", "order": order })),
    ))
}

async fn get_my_orders(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse, ApiError> {
    let orders = state.orders.buyer_orders(user.0.id).await?;
    Ok(Json(json!({ "success": true, "count": orders.len(), "orders": orders })))
}

async fn get_seller_orders(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse, ApiError> {
    user.require_role(&[Role::Farmer, Role::Processor])?;
    let orders = state.orders.seller_orders(user.0.id).await?;
    Ok(Json(json!({ "success": true, "count": orders.len(), "orders": orders })))
}

#[instrument(skip_all, fields(order_id = %id))]
async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.orders.order_for(id, &user.requester()).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

#[instrument(skip_all, fields(order_id = %id, status = %update.status))]
async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_role(&[Role::Farmer, Role::Processor, Role::Admin])?;
    let order = state
        .orders
        .update_status(id, update.status, update.note, user.requester())
        .await?;
    Ok(Json(json!({ "success": true, "message": "Order status updated successfully", "order": order })))
}

#[instrument(skip_all, fields(order_id = %id))]
async fn update_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<PaymentUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .orders
        .record_payment(id, update.transaction_id, update.status, user.requester())
        .await?;
    Ok(Json(json!({ "success": true, "message": "Payment status updated successfully", "order": order })))
}
