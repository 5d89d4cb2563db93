use chrono::{DateTime, Utc};

use crate::domain::{Order, OrderStatus, PaymentStatus, Requester};

/// Custom actions for Order documents.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Move the order along its lifecycle. Seller or admin only.
    Transition {
        status: OrderStatus,
        note: Option<String>,
        requester: Requester,
        at: DateTime<Utc>,
    },
    /// Record a payment outcome reported by the buyer. Buyer or admin only.
    RecordPayment {
        transaction_id: Option<String>,
        status: PaymentStatus,
        requester: Requester,
        at: DateTime<Utc>,
    },
}

/// The updated order together with the status it left.
#[derive(Debug, Clone)]
pub struct OrderChange {
    pub order: Order,
    pub previous: OrderStatus,
}
