use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::domain::{Order, OrderStatus, Product, Role, User, VerificationStatus};
use crate::notifications::{NotificationEvent, Recipient};
use super::{ApiError, ApiJson, ApiQuery, AppState, AuthUser, Paging};

const DEFAULT_USER_PAGE_SIZE: usize = 20;
const TOP_PRODUCTS: usize = 10;
const RECENT_ORDERS: usize = 10;

/// Every route here is admin-only; the check runs in each handler through
/// [`admin`].
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products/pending", get(get_pending_products))
        .route("/products/{id}/verify", put(verify_product))
        .route("/users", get(get_all_users))
        .route("/users/{id}/status", put(update_user_status))
        .route("/users/{id}", delete(delete_user))
        .route("/analytics", get(get_analytics))
}

fn admin(user: &AuthUser) -> Result<(), ApiError> {
    user.require_role(&[Role::Admin])
}

async fn get_pending_products(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse, ApiError> {
    admin(&user)?;
    let mut products = state
        .products
        .list_products(|p| p.is_active && p.verification_status == VerificationStatus::Pending)
        .await?;
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(json!({ "success": true, "count": products.len(), "products": products })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    status: VerificationStatus,
    #[serde(default)]
    rejection_reason: Option<String>,
}

#[instrument(skip_all, fields(product_id = %id, decision = ?request.status))]
async fn verify_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<VerifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    admin(&user)?;
    let product = state
        .products
        .verify(id, request.status, user.0.id.clone(), request.rejection_reason)
        .await?;
    info!(seller = %product.seller, "Product verification recorded");

    let decision = match request.status {
        VerificationStatus::Approved => "approved",
        VerificationStatus::Rejected => "rejected",
        VerificationStatus::Pending => "pending",
    };
    state.dispatcher.dispatch(
        Recipient::User(product.seller.clone()),
        NotificationEvent::product(format!("Your product \"{}\" has been {}", product.name, decision), &product.id),
    );
    Ok(Json(json!({
        "success": true,
        "message": format!("Product {decision} successfully"),
        "product": product,
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    role: Option<Role>,
    page: Option<usize>,
    limit: Option<usize>,
}

async fn get_all_users(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    admin(&user)?;
    let role = query.role;
    let mut users = state.users.list_users(move |u| role.map_or(true, |r| u.role == r)).await?;
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let paging = Paging::new(query.page, query.limit, DEFAULT_USER_PAGE_SIZE);
    let total = users.len();
    let profiles: Vec<_> = paging.window(&users).into_iter().map(User::profile).collect();
    Ok(Json(json!({
        "success": true,
        "count": profiles.len(),
        "total": total,
        "page": paging.page,
        "pages": paging.pages(total),
        "users": profiles,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    is_verified: Option<bool>,
}

#[instrument(skip_all, fields(user_id = %id))]
async fn update_user_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    admin(&user)?;
    let updated = state.users.set_status(id, request.is_active, request.is_verified).await?;
    Ok(Json(json!({
        "success": true,
        "message": "User status updated successfully",
        "user": updated.profile(),
    })))
}

/// Accounts are never removed, only deactivated.
#[instrument(skip_all, fields(user_id = %id))]
async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    admin(&user)?;
    state.users.set_status(id, Some(false), None).await?;
    Ok(Json(json!({ "success": true, "message": "User deactivated successfully" })))
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct UserCounts {
    pub total: usize,
    pub farmers: usize,
    pub processors: usize,
    pub customers: usize,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct ProductCounts {
    pub total: usize,
    pub verified: usize,
    pub pending: usize,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct OrderCounts {
    pub total: usize,
    pub pending: usize,
    pub delivered: usize,
}

#[derive(Debug)]
pub struct Analytics {
    pub users: UserCounts,
    pub products: ProductCounts,
    pub orders: OrderCounts,
    pub revenue: f64,
    pub popular_products: Vec<Product>,
    pub recent_orders: Vec<Order>,
}

/// Marketplace totals. Revenue counts delivered orders only.
pub fn summarize(users: &[User], mut products: Vec<Product>, mut orders: Vec<Order>) -> Analytics {
    let count_role = |role: Role| users.iter().filter(|u| u.role == role).count();
    let user_counts = UserCounts {
        total: users.len(),
        farmers: count_role(Role::Farmer),
        processors: count_role(Role::Processor),
        customers: count_role(Role::Customer),
    };

    products.retain(|p| p.is_active);
    let product_counts = ProductCounts {
        total: products.len(),
        verified: products.iter().filter(|p| p.is_verified).count(),
        pending: products.iter().filter(|p| p.verification_status == VerificationStatus::Pending).count(),
    };

    let delivered = orders.iter().filter(|o| o.order_status == OrderStatus::Delivered);
    let revenue = delivered.clone().map(|o| o.total_price).sum::<f64>();
    let order_counts = OrderCounts {
        total: orders.len(),
        pending: orders.iter().filter(|o| o.order_status == OrderStatus::Pending).count(),
        delivered: delivered.count(),
    };

    products.sort_by(|a, b| b.sold_count.cmp(&a.sold_count));
    products.truncate(TOP_PRODUCTS);
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders.truncate(RECENT_ORDERS);

    Analytics {
        users: user_counts,
        products: product_counts,
        orders: order_counts,
        revenue,
        popular_products: products,
        recent_orders: orders,
    }
}

async fn get_analytics(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse, ApiError> {
    admin(&user)?;
    let users = state.users.list_users(|_| true).await?;
    let products = state.products.list_products(|_| true).await?;
    let orders = state.orders.list_orders(|_| true).await?;
    let analytics = summarize(&users, products, orders);
    Ok(Json(json!({
        "success": true,
        "analytics": {
            "users": analytics.users,
            "products": analytics.products,
            "orders": analytics.orders,
            "revenue": { "total": analytics.revenue },
            "popularProducts": analytics.popular_products,
            "recentOrders": analytics.recent_orders,
        },
    })))
}
