use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::auth::AuthError;
use crate::domain::{Requester, Role, User};
use super::{ApiError, AppState};

/// JSON body whose rejection renders as an [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejection renders as an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// The active user behind a valid bearer token.
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn requester(&self) -> Requester {
        Requester::from(&self.0)
    }

    /// Reject callers whose role is not in `roles`.
    pub fn require_role(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.0.role) {
            Ok(())
        } else {
            Err(AuthError::RoleNotAllowed(self.0.role.as_str()).into())
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::NotAuthorized)?;
        let user = state.auth.authenticate(&token).await?;
        Ok(AuthUser(user))
    }
}

/// Like [`AuthUser`], but anonymous or invalid credentials yield `None`.
pub struct MaybeAuthUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = match bearer_token(parts) {
            Some(token) => state.auth.authenticate(&token).await.ok(),
            None => None,
        };
        Ok(MaybeAuthUser(user))
    }
}
