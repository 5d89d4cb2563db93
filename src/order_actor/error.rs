use thiserror::Error;

use crate::actor_framework::FrameworkError;
use crate::domain::OrderStatus;
use crate::product_actor::ProductError;
use crate::user_actor::UserError;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("No order items")]
    EmptyOrder,
    #[error("All items in an order must come from the same seller")]
    MixedSellers,
    #[error("Order is already {from} and cannot be moved to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Not authorized to {0} this order")]
    Forbidden(&'static str),
    #[error("Order validation error: {0}")]
    ValidationError(String),
    #[error(transparent)]
    Product(#[from] ProductError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for OrderError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => OrderError::NotFound(id),
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}
