//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_create`] or [`expect_action`] to assert behavior.
//! [`RecordingDispatcher`] and [`CapturingMailer`] stand in for the notifier
//! and the mail transport.

use std::sync::Mutex;

use futures::future::BoxFuture;
use tokio::sync::mpsc;

use crate::actor_framework::{Entity, Filter, ResourceClient, ResourceRequest, Response};
use crate::auth::{Mail, MailError, Mailer};
use crate::notifications::{NotificationDispatcher, NotificationEvent, Recipient};

/// Creates a mock client and a receiver for asserting requests.
///
/// # Testing Strategy
/// When testing *client* logic (e.g. the `OrderClient` saga) we don't want to
/// spin up a full `ResourceActor`. The mock client sends messages to a channel
/// we control, so a test can inspect each request and answer it with success,
/// failure, or by dropping the responder.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreatePayload, Response<T, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { payload, respond_to }) => Some((payload, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<T>, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Query request
pub async fn expect_query<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(Filter<T>, Response<Vec<T>, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Query { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}

/// Dispatcher that records events instead of delivering them.
#[derive(Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<(Recipient, NotificationEvent)>>,
}

impl RecordingDispatcher {
    pub fn events(&self) -> Vec<(Recipient, NotificationEvent)> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn dispatch(&self, recipient: Recipient, event: NotificationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push((recipient, event));
        }
    }
}

/// Mailer that keeps outgoing mail, or refuses it when built with
/// [`CapturingMailer::failing`].
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<Mail>>,
    fail: bool,
}

impl CapturingMailer {
    pub fn failing() -> Self {
        Self { sent: Mutex::new(Vec::new()), fail: true }
    }

    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl Mailer for CapturingMailer {
    fn send(&self, mail: Mail) -> BoxFuture<'_, Result<(), MailError>> {
        Box::pin(async move {
            if self.fail {
                return Err(MailError("smtp unavailable".into()));
            }
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(mail);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::UserClient;
    use crate::domain::{Role, User, UserCreate};
    use crate::user_actor::UserError;

    fn payload() -> UserCreate {
        UserCreate {
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            phone: "9876543210".to_string(),
            role: Role::Customer,
            address: None,
            farm_details: None,
            business_details: None,
            is_verified: false,
        }
    }

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<User>(10);

        let create_task = tokio::spawn(async move { client.create(payload()).await });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.name, "Test");
        responder.send(Err(UserError::AlreadyExists)).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result.unwrap_err(), UserError::AlreadyExists);
    }

    #[tokio::test]
    async fn test_require_maps_missing_to_not_found() {
        let (inner, mut receiver) = create_mock_client::<User>(10);
        let client = UserClient::new(inner);

        let task = tokio::spawn(async move { client.require_user("user_9".into()).await });
        let (id, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        assert_eq!(id, "user_9");
        responder.send(Ok(None)).unwrap();

        assert_eq!(task.await.unwrap().unwrap_err(), UserError::NotFound("user_9".into()));
    }

    #[tokio::test]
    async fn test_dropped_responder_surfaces_as_communication_error() {
        let (inner, mut receiver) = create_mock_client::<User>(10);
        let client = UserClient::new(inner);

        let task = tokio::spawn(async move { client.find_by_email("a@b.com".into()).await });
        let (_filter, responder) = expect_query(&mut receiver).await.expect("Expected Query request");
        drop(responder);

        assert!(matches!(task.await.unwrap(), Err(UserError::ActorCommunicationError(_))));
    }
}
