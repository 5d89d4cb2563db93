use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::order_actor::OrderError;
use crate::product_actor::ProductError;
use crate::user_actor::UserError;

/// Every handler failure, rendered as `{"success": false, "message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(ref message) => {
                error!(%message, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "success": false, "message": self.to_string() }))).into_response()
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound(_) => ApiError::NotFound("User not found".into()),
            UserError::NotificationNotFound(_) => ApiError::NotFound("Notification not found".into()),
            UserError::AlreadyExists | UserError::ValidationError(_) | UserError::InvalidResetToken => {
                ApiError::BadRequest(e.to_string())
            }
            UserError::ActorCommunicationError(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ProductError> for ApiError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::NotFound(_) => ApiError::NotFound("Product not found".into()),
            ProductError::Forbidden(_) => ApiError::Forbidden(e.to_string()),
            ProductError::ActorCommunicationError(_) => ApiError::Internal(e.to_string()),
            ProductError::NotPurchasable(_)
            | ProductError::InsufficientStock { .. }
            | ProductError::InvalidQuantity(_)
            | ProductError::BelowMinimumOrder { .. }
            | ProductError::ValidationError(_)
            | ProductError::AlreadyReviewed => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(_) => ApiError::NotFound("Order not found".into()),
            OrderError::Forbidden(_) => ApiError::Forbidden(e.to_string()),
            OrderError::Product(inner) => inner.into(),
            OrderError::User(inner) => inner.into(),
            OrderError::ActorCommunicationError(_) => ApiError::Internal(e.to_string()),
            OrderError::EmptyOrder
            | OrderError::MixedSellers
            | OrderError::InvalidTransition { .. }
            | OrderError::ValidationError(_) => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredentials | AuthError::AdminRegistration => ApiError::BadRequest(e.to_string()),
            AuthError::InvalidCredentials | AuthError::NotAuthorized | AuthError::IncorrectPassword => {
                ApiError::Unauthorized(e.to_string())
            }
            AuthError::Deactivated | AuthError::RoleNotAllowed(_) => ApiError::Forbidden(e.to_string()),
            AuthError::UnknownEmail => ApiError::NotFound(e.to_string()),
            AuthError::User(inner) => inner.into(),
            AuthError::EmailNotSent | AuthError::Hashing(_) | AuthError::Signing(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderStatus;

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (AuthError::Deactivated.into(), StatusCode::FORBIDDEN),
            (AuthError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (UserError::InvalidResetToken.into(), StatusCode::BAD_REQUEST),
            (ProductError::NotFound("p".into()).into(), StatusCode::NOT_FOUND),
            (
                OrderError::InvalidTransition { from: OrderStatus::Delivered, to: OrderStatus::Delivered }.into(),
                StatusCode::BAD_REQUEST,
            ),
            (OrderError::Product(ProductError::Forbidden("update")).into(), StatusCode::FORBIDDEN),
            (AuthError::EmailNotSent.into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
