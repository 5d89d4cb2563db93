use std::cmp::Ordering;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::domain::{Category, MilletType, Product, ProductImage, Review, Role, SellerType, User, VerificationStatus};
use crate::notifications::{NotificationEvent, Recipient};
use crate::product_actor::{ProductChanges, ProductCreate, ProductDraft, ProductError, ProductPatch};
use super::{ApiError, ApiJson, ApiQuery, AppState, AuthUser, MaybeAuthUser, Paging};

const DEFAULT_PAGE_SIZE: usize = 12;
const MAX_PRODUCT_IMAGES: usize = 5;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_products).post(create_product))
        .route("/seller/my-products", get(get_my_products))
        .route("/{id}", get(get_product).put(update_product).delete(delete_product))
        .route("/{id}/images", post(upload_images))
        .route("/{id}/reviews", post(add_review))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    PriceLow,
    PriceHigh,
    Rating,
    Popular,
    #[default]
    #[serde(other)]
    Newest,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub search: Option<String>,
    pub millet_type: Option<MilletType>,
    pub category: Option<Category>,
    /// Matches `location.state`.
    pub location: Option<String>,
    /// Minimum average rating.
    pub rating: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    #[serde(default)]
    pub sort: SortOrder,
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub verified: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub count: usize,
    pub total: usize,
    pub page: usize,
    pub pages: usize,
    pub products: Vec<Product>,
}

/// Customers and anonymous callers only ever see approved listings.
fn approved_only(query: &ProductQuery, viewer: Option<&User>) -> bool {
    query.verified == Some(true) || viewer.map_or(true, |user| user.role == Role::Customer)
}

fn is_approved(product: &Product) -> bool {
    product.is_verified && product.verification_status == VerificationStatus::Approved
}

fn matches(product: &Product, query: &ProductQuery) -> bool {
    query.search.as_deref().map_or(true, |needle| product.matches_search(needle))
        && query.millet_type.map_or(true, |t| product.millet_type == t)
        && query.category.map_or(true, |c| product.category == c)
        && query
            .location
            .as_deref()
            .map_or(true, |state| product.location.state.as_deref() == Some(state))
        && query.rating.map_or(true, |min| product.rating >= min)
        && query.min_price.map_or(true, |min| product.price >= min)
        && query.max_price.map_or(true, |max| product.price <= max)
}

fn compare(sort: SortOrder, a: &Product, b: &Product) -> Ordering {
    match sort {
        SortOrder::PriceLow => a.price.total_cmp(&b.price),
        SortOrder::PriceHigh => b.price.total_cmp(&a.price),
        SortOrder::Rating => b.rating.total_cmp(&a.rating).then(b.num_reviews.cmp(&a.num_reviews)),
        SortOrder::Popular => b.sold_count.cmp(&a.sold_count).then(b.view_count.cmp(&a.view_count)),
        SortOrder::Newest => b.created_at.cmp(&a.created_at),
    }
}

/// Filter, sort and paginate a catalog snapshot for one viewer.
pub fn select_products(mut products: Vec<Product>, query: &ProductQuery, viewer: Option<&User>) -> ProductPage {
    let approved_only = approved_only(query, viewer);
    products.retain(|p| p.is_active && (!approved_only || is_approved(p)) && matches(p, query));
    products.sort_by(|a, b| compare(query.sort, a, b));

    let paging = Paging::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let total = products.len();
    let products = paging.window(products);
    ProductPage { count: products.len(), total, page: paging.page, pages: paging.pages(total), products }
}

#[instrument(skip_all)]
async fn get_products(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state.products.list_products(|p| p.is_active).await?;
    let page = select_products(products, &query, viewer.as_ref());
    Ok(Json(json!({
        "success": true,
        "count": page.count,
        "total": page.total,
        "page": page.page,
        "pages": page.pages,
        "products": page.products,
    })))
}

/// Inactive or unapproved listings are only visible to their seller and
/// admins; everyone else gets a 404.
#[instrument(skip_all, fields(product_id = %id))]
async fn get_product(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.products.require_product(id.clone()).await?;
    let visible = (product.is_active && is_approved(&product))
        || viewer.as_ref().is_some_and(|u| u.is_admin() || u.id == product.seller);
    if !visible {
        return Err(ProductError::NotFound(id).into());
    }
    let product = state.products.record_view(id).await?;
    Ok(Json(json!({ "success": true, "product": product })))
}

#[instrument(skip_all, fields(seller = %user.0.id))]
async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(draft): ApiJson<ProductDraft>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_role(&[Role::Farmer, Role::Processor])?;
    let seller_type = if user.0.role == Role::Farmer { SellerType::Farmer } else { SellerType::Processor };
    let product = state
        .products
        .create_product(ProductCreate { seller: user.0.id.clone(), seller_type, draft })
        .await?;
    info!(product_id = %product.id, "Product submitted for verification");

    state.dispatcher.dispatch(
        Recipient::Admins,
        NotificationEvent::product("New product submitted for verification", &product.id),
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Product created successfully. Awaiting admin verification.",
            "product": product,
        })),
    ))
}

#[instrument(skip_all, fields(product_id = %id, editor = %user.0.id))]
async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<ProductChanges>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = ProductPatch { editor: user.requester(), changes };
    let product = state.products.update_product(id, patch).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Product updated successfully",
        "product": product,
    })))
}

#[instrument(skip_all, fields(product_id = %id))]
async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.products.deactivate(id, user.requester()).await?;
    Ok(Json(json!({ "success": true, "message": "Product deleted successfully" })))
}

#[instrument(skip_all, fields(product_id = %id))]
async fn upload_images(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let requester = user.requester();
    let product = state.products.require_product(id.clone()).await?;
    if !requester.may_manage(&product.seller) {
        return Err(ProductError::Forbidden("update").into());
    }

    let files = state
        .uploads
        .save_files(&mut multipart, "images", "products", MAX_PRODUCT_IMAGES)
        .await?;
    let images = files
        .iter()
        .map(|f| ProductImage { url: f.url.clone(), public_id: Some(f.file_name.clone()) })
        .collect();
    let product = match state.products.add_images(id, requester, images).await {
        Ok(product) => product,
        Err(e) => {
            state.uploads.discard(&files).await;
            return Err(e.into());
        }
    };
    Ok(Json(json!({ "success": true, "message": "Images uploaded successfully", "product": product })))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    rating: u8,
    #[serde(default)]
    comment: Option<String>,
}

#[instrument(skip_all, fields(product_id = %id, reviewer = %user.0.id))]
async fn add_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_role(&[Role::Customer])?;
    let review = Review {
        user: user.0.id.clone(),
        name: user.0.name.clone(),
        rating: request.rating,
        comment: request.comment,
        created_at: Utc::now(),
    };
    let product = state.products.add_review(id, review).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Review added successfully",
            "rating": product.rating,
            "numReviews": product.num_reviews,
        })),
    ))
}

#[instrument(skip_all, fields(seller = %user.0.id))]
async fn get_my_products(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse, ApiError> {
    user.require_role(&[Role::Farmer, Role::Processor, Role::Admin])?;
    let seller = user.0.id.clone();
    let mut products = state.products.list_products(move |p| p.seller == seller).await?;
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(json!({ "success": true, "count": products.len(), "products": products })))
}
