//! Fire-and-forget notification dispatch.
//!
//! Every business event is sent through [`NotificationDispatcher`] as a
//! `(recipient, event)` pair. The production [`Notifier`] appends the event
//! to each recipient's inbox and broadcasts it to live WebSocket sessions.
//! Delivery is best effort: failures are logged and never retried.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::clients::UserClient;
use crate::domain::{Notification, NotificationKind, Role};

#[derive(Debug, Clone, PartialEq)]
pub enum Recipient {
    User(String),
    /// Every active admin account.
    Admins,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    pub message: String,
    pub kind: NotificationKind,
    pub reference: Option<String>,
}

impl NotificationEvent {
    pub fn order(message: impl Into<String>, order_id: &str) -> Self {
        Self { message: message.into(), kind: NotificationKind::Order, reference: Some(order_id.to_string()) }
    }

    pub fn product(message: impl Into<String>, product_id: &str) -> Self {
        Self { message: message.into(), kind: NotificationKind::Product, reference: Some(product_id.to_string()) }
    }

    pub fn payment(message: impl Into<String>, order_id: &str) -> Self {
        Self { message: message.into(), kind: NotificationKind::Payment, reference: Some(order_id.to_string()) }
    }
}

/// A notification as pushed to a live session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveNotification {
    pub recipient: String,
    pub notification: Notification,
}

pub trait NotificationDispatcher: Send + Sync {
    /// Queue `event` for `recipient` and return immediately.
    fn dispatch(&self, recipient: Recipient, event: NotificationEvent);
}

#[derive(Clone)]
pub struct Notifier {
    users: UserClient,
    live: broadcast::Sender<LiveNotification>,
}

impl Notifier {
    pub fn new(users: UserClient, capacity: usize) -> Self {
        let (live, _) = broadcast::channel(capacity);
        Self { users, live }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveNotification> {
        self.live.subscribe()
    }

    #[instrument(skip(self, event), fields(kind = ?event.kind))]
    async fn deliver(&self, recipient: Recipient, event: NotificationEvent) {
        let user_ids = match recipient {
            Recipient::User(id) => vec![id],
            Recipient::Admins => match self.users.list_users(|u| u.role == Role::Admin && u.is_active).await {
                Ok(admins) => admins.into_iter().map(|u| u.id).collect(),
                Err(e) => {
                    warn!(error = %e, "Could not resolve admin recipients");
                    return;
                }
            },
        };

        for user_id in user_ids {
            let notification = Notification {
                id: Uuid::new_v4().to_string(),
                message: event.message.clone(),
                kind: event.kind,
                reference: event.reference.clone(),
                read: false,
                created_at: Utc::now(),
            };
            if let Err(e) = self.users.push_notification(user_id.clone(), notification.clone()).await {
                warn!(user_id = %user_id, error = %e, "Notification not stored");
                continue;
            }
            // No live subscribers is not an error.
            let delivered = self.live.send(LiveNotification { recipient: user_id.clone(), notification }).unwrap_or(0);
            debug!(user_id = %user_id, live_sessions = delivered, "Notification delivered");
        }
    }
}

impl NotificationDispatcher for Notifier {
    fn dispatch(&self, recipient: Recipient, event: NotificationEvent) {
        let notifier = self.clone();
        tokio::spawn(async move { notifier.deliver(recipient, event).await });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use crate::domain::{User, UserCreate};
    use std::time::Duration;

    async fn users() -> UserClient {
        let counter = std::sync::atomic::AtomicU64::new(1);
        let (actor, client) = ResourceActor::<User>::new(16, move || {
            format!("user_{}", counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
        });
        tokio::spawn(actor.run());
        UserClient::new(client)
    }

    fn account(email: &str, role: Role) -> UserCreate {
        UserCreate {
            name: "Someone".into(),
            email: email.into(),
            password_hash: "hash".into(),
            phone: "9876543210".into(),
            role,
            address: None,
            farm_details: None,
            business_details: None,
            is_verified: true,
        }
    }

    #[tokio::test]
    async fn test_admin_broadcast_reaches_inbox_and_live_session() {
        let users = users().await;
        let admin = users.create_user(account("admin@example.com", Role::Admin)).await.unwrap();
        let customer = users.create_user(account("c@example.com", Role::Customer)).await.unwrap();

        let notifier = Notifier::new(users.clone(), 8);
        let mut live = notifier.subscribe();
        notifier.dispatch(Recipient::Admins, NotificationEvent::product("New product submitted for verification", "p1"));

        let pushed = tokio::time::timeout(Duration::from_secs(1), live.recv()).await.unwrap().unwrap();
        assert_eq!(pushed.recipient, admin.id);
        assert_eq!(pushed.notification.reference.as_deref(), Some("p1"));

        let admin = users.require_user(admin.id).await.unwrap();
        assert_eq!(admin.notifications.len(), 1);
        let customer = users.require_user(customer.id).await.unwrap();
        assert!(customer.notifications.is_empty());
    }
}
