use thiserror::Error;

use crate::actor_framework::FrameworkError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),
    #[error("Product is not available for purchase: {0}")]
    NotPurchasable(String),
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),
    #[error("Minimum order quantity is {minimum}, requested {requested}")]
    BelowMinimumOrder { requested: u32, minimum: u32 },
    #[error("Product validation error: {0}")]
    ValidationError(String),
    #[error("Product already reviewed")]
    AlreadyReviewed,
    #[error("Not authorized to {0} this product")]
    Forbidden(&'static str),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for ProductError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => ProductError::NotFound(id),
            other => ProductError::ActorCommunicationError(other.to_string()),
        }
    }
}
