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

use crate::auth::Registration;
use super::{ApiError, ApiJson, AppState, AuthUser};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/{reset_token}", put(reset_password))
        .route("/me", get(get_me))
        .route("/update-password", put(update_password))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    current_password: String,
    new_password: String,
}

#[instrument(skip_all)]
async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<Registration>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.auth.register(registration).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Registration successful",
            "token": session.token,
            "user": session.user.profile(),
        })),
    ))
}

#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.auth.login(request.email, request.password).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": session.token,
        "user": session.user.profile(),
    })))
}

async fn get_me(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(json!({ "success": true, "user": user.profile() }))
}

#[instrument(skip_all)]
async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.forgot_password(request.email).await?;
    Ok(Json(json!({ "success": true, "message": "Password reset email sent" })))
}

#[instrument(skip_all)]
async fn reset_password(
    State(state): State<AppState>,
    Path(reset_token): Path<String>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.auth.reset_password(&reset_token, request.password).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Password reset successful",
        "token": session.token,
    })))
}

#[instrument(skip_all, fields(user_id = %user.id))]
async fn update_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .auth
        .update_password(user.id, request.current_password, request.new_password)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully",
        "token": session.token,
    })))
}

/// Tokens are stateless; the client discards its copy.
async fn logout(_user: AuthUser) -> impl IntoResponse {
    Json(json!({ "success": true, "message": "Logged out successfully" }))
}
