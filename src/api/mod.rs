//! HTTP surface of the marketplace.
//!
//! Handlers are thin: they extract the caller and the payload, call one of
//! the actor clients and shape the JSON envelope. Business rules live in the
//! entity hooks and the clients.

mod admin_routes;
mod auth_routes;
mod error;
mod extract;
mod health;
mod order_routes;
mod paging;
mod product_routes;
mod uploads;
mod user_routes;
mod ws;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::auth::AuthService;
use crate::clients::{OrderClient, ProductClient, UserClient};
use crate::notifications::{NotificationDispatcher, Notifier};

pub use error::ApiError;
pub use extract::{ApiJson, ApiQuery, AuthUser, MaybeAuthUser};
pub use paging::Paging;
pub use uploads::UploadStore;

/// Room for a full batch of product images plus multipart framing.
const UPLOAD_BATCH_FILES: usize = 5;
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub users: UserClient,
    pub products: ProductClient,
    pub orders: OrderClient,
    pub auth: AuthService,
    pub notifier: Notifier,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    pub uploads: Arc<UploadStore>,
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.uploads.max_file_size() * UPLOAD_BATCH_FILES + MULTIPART_OVERHEAD;
    let uploads = ServeDir::new(state.uploads.root());

    Router::new()
        .route("/health", get(health::health))
        .route("/ws", get(ws::connect))
        .nest("/api/auth", auth_routes::routes())
        .nest("/api/products", product_routes::routes())
        .nest("/api/orders", order_routes::routes())
        .nest("/api/users", user_routes::routes())
        .nest("/api/admin", admin_routes::routes())
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
