use chrono::{DateTime, Utc};

use crate::domain::Notification;

/// Custom actions for User documents.
///
/// Every action returns the updated [`crate::domain::User`].
#[derive(Debug, Clone)]
pub enum UserAction {
    RecordLogin { at: DateTime<Utc> },
    /// Replace the password hash. Any outstanding reset token is dropped.
    SetPassword { password_hash: String },
    IssueResetToken { token_hash: String, expires_at: DateTime<Utc> },
    ClearResetToken,
    /// Single-use redemption, accepted only while `now` is before the expiry.
    RedeemResetToken {
        token_hash: String,
        password_hash: String,
        now: DateTime<Utc>,
    },
    CreditEarnings(f64),
    IncrementOrders,
    PushNotification(Notification),
    MarkNotificationRead { notification_id: String },
    SetStatus {
        is_active: Option<bool>,
        is_verified: Option<bool>,
    },
    SetProfileImage(String),
}
