use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use tracing::instrument;

use crate::domain::UserPatch;
use crate::user_actor::UserError;
use super::{ApiError, ApiJson, AppState, AuthUser};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/image", put(upload_profile_image))
        .route("/notifications", get(get_notifications))
        .route("/notifications/{notification_id}/read", put(mark_notification_read))
        .route("/{id}", get(get_public_profile))
}

async fn get_profile(user: AuthUser) -> impl IntoResponse {
    Json(json!({ "success": true, "user": user.0.profile() }))
}

#[instrument(skip_all, fields(user_id = %user.0.id))]
async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.users.update_profile(user.0.id, patch).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": updated.profile(),
    })))
}

#[instrument(skip_all, fields(user_id = %user.0.id))]
async fn upload_profile_image(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut files = state.uploads.save_files(&mut multipart, "profileImage", "profiles", 1).await?;
    let file = files.pop().ok_or_else(|| ApiError::BadRequest("Please upload a file".into()))?;
    let updated = match state.users.set_profile_image(user.0.id, file.url.clone()).await {
        Ok(updated) => updated,
        Err(e) => {
            state.uploads.discard(&[file]).await;
            return Err(e.into());
        }
    };
    Ok(Json(json!({
        "success": true,
        "message": "Profile image updated successfully",
        "profileImage": updated.profile_image,
    })))
}

async fn get_notifications(user: AuthUser) -> impl IntoResponse {
    let mut notifications = user.0.notifications;
    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let unread = notifications.iter().filter(|n| !n.read).count();
    Json(json!({
        "success": true,
        "count": notifications.len(),
        "unread": unread,
        "notifications": notifications,
    }))
}

#[instrument(skip_all, fields(user_id = %user.0.id, notification_id = %notification_id))]
async fn mark_notification_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(notification_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.users.mark_notification_read(user.0.id, notification_id).await?;
    Ok(Json(json!({ "success": true, "message": "Notification marked as read" })))
}

/// Storefront view of a seller: no contact details or account state.
#[instrument(skip(state))]
async fn get_public_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .get_user(id.clone())
        .await?
        .filter(|u| u.is_active)
        .ok_or(UserError::NotFound(id))?;
    Ok(Json(json!({
        "success": true,
        "user": {
            "id": user.id,
            "name": user.name,
            "role": user.role,
            "profileImage": user.profile_image,
            "farmDetails": user.farm_details,
            "businessDetails": user.business_details,
            "rating": user.rating,
            "reviews": user.reviews,
            "createdAt": user.created_at,
        },
    })))
}
