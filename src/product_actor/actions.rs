use chrono::{DateTime, Utc};

use crate::domain::{OrderItem, Product, ProductImage, Requester, Review, VerificationStatus};

/// Custom actions for Product entities.
///
/// These actions represent domain-specific operations that can be performed
/// on a product beyond standard CRUD operations.
#[derive(Debug, Clone)]
pub enum ProductAction {
    /// Atomically takes stock for an order line.
    ///
    /// # Errors
    /// Fails without touching stock if the product is not purchasable, the
    /// quantity is below the minimum order, or stock is insufficient.
    Reserve { quantity: u32 },
    /// Returns previously reserved stock (rollback or cancellation).
    Release { quantity: u32 },
    RecordView,
    /// Admin decision on a listing. `Pending` is not a valid decision.
    Verify {
        decision: VerificationStatus,
        admin_id: String,
        rejection_reason: Option<String>,
        at: DateTime<Utc>,
    },
    AddReview(Review),
    /// Soft delete.
    Deactivate { requester: Requester },
    AddImages { requester: Requester, images: Vec<ProductImage> },
}

/// Stock taken for one order line, with the snapshot to store on the order.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub item: OrderItem,
    pub seller: String,
}

#[derive(Debug, Clone)]
pub enum ProductActionResult {
    /// Result from Reserve
    Reserved(Reservation),
    /// Every other action returns the updated product
    Updated(Product),
}
