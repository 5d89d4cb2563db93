use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, DTOs, and Actions)
// =============================================================================

/// Failures of the actor plumbing itself, as opposed to domain rejections.
///
/// Every entity error type converts from this, so clients can surface mailbox
/// failures through their own domain error.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item conflicts with existing record: {0}")]
    Conflict(String),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait that any document managed by a [`ResourceActor`] must implement.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreatePayload: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;

    // --- Custom Actions ---
    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;

    type Error: std::error::Error + From<FrameworkError> + Clone + Send + Sync + 'static;

    /// Collection name, used in spans and as the snapshot file stem.
    const COLLECTION: &'static str;

    fn id(&self) -> &Self::Id;

    /// Construct the document from a fresh id, its 1-based creation sequence
    /// within the collection, and the payload.
    fn from_create(id: Self::Id, sequence: u64, payload: Self::CreatePayload) -> Result<Self, Self::Error>;

    /// Unique-index check run against every stored document before insert.
    fn conflicts_with(&self, _existing: &Self) -> bool {
        false
    }

    // --- Lifecycle Hooks ---

    fn on_update(&mut self, patch: Self::Patch) -> Result<(), Self::Error>;

    // --- Action Handler ---

    /// Handle a custom domain-specific action.
    ///
    /// The actor runs this against a working copy and only commits it when
    /// the action returns `Ok`, so a rejected action leaves the stored
    /// document untouched.
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T, E> = oneshot::Sender<Result<T, E>>;
pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

pub enum ResourceRequest<T: Entity> {
    Create {
        payload: T::CreatePayload,
        respond_to: Response<T, T::Error>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>, T::Error>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T, T::Error>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
    Query {
        filter: Filter<T>,
        respond_to: Response<Vec<T>, T::Error>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    sequence: u64,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
    snapshot: Option<PathBuf>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            sequence: 0,
            next_id_fn: Box::new(next_id_fn),
            snapshot: None,
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Back the collection with a JSON snapshot file.
    ///
    /// Existing documents are loaded now; the full collection is written back
    /// when the mailbox closes. A missing file starts an empty collection.
    pub async fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let path = path.into();
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let items: Vec<T> = serde_json::from_slice(&bytes)?;
                for item in items {
                    self.store.insert(item.id().clone(), item);
                }
                self.sequence = self.store.len() as u64;
                info!(collection = T::COLLECTION, documents = self.store.len(), "Snapshot loaded");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(collection = T::COLLECTION, "No snapshot found, starting empty");
            }
            Err(e) => return Err(e.into()),
        }
        self.snapshot = Some(path);
        Ok(self)
    }

    #[instrument(name = "resource_actor", skip(self), fields(collection = T::COLLECTION))]
    pub async fn run(mut self) {
        info!("ResourceActor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { payload, respond_to } => {
                    let _ = respond_to.send(self.handle_create(payload));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.store.get(&id).cloned()));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let _ = respond_to.send(self.handle_update(id, patch));
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let _ = respond_to.send(self.handle_action(id, action));
                }
                ResourceRequest::Query { filter, respond_to } => {
                    let items = self.store.values().filter(|item| filter(*item)).cloned().collect();
                    let _ = respond_to.send(Ok(items));
                }
            }
        }

        if let Some(path) = self.snapshot.take() {
            if let Err(e) = self.write_snapshot(&path).await {
                error!(error = %e, path = %path.display(), "Snapshot write failed");
            }
        }
        info!("ResourceActor stopped");
    }

    fn handle_create(&mut self, payload: T::CreatePayload) -> Result<T, T::Error> {
        let id = (self.next_id_fn)();
        let item = T::from_create(id.clone(), self.sequence + 1, payload)?;
        if self.store.values().any(|existing| item.conflicts_with(existing)) {
            debug!(item_id = %id, "Create rejected by unique check");
            return Err(FrameworkError::Conflict(id.to_string()).into());
        }
        self.sequence += 1;
        self.store.insert(id.clone(), item.clone());
        debug!(item_id = %id, "Document created");
        Ok(item)
    }

    fn handle_update(&mut self, id: T::Id, patch: T::Patch) -> Result<T, T::Error> {
        let mut working = self
            .store
            .get(&id)
            .cloned()
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        working.on_update(patch)?;
        self.store.insert(id, working.clone());
        Ok(working)
    }

    fn handle_action(&mut self, id: T::Id, action: T::Action) -> Result<T::ActionResult, T::Error> {
        let mut working = self
            .store
            .get(&id)
            .cloned()
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        let result = working.handle_action(action)?;
        self.store.insert(id, working);
        Ok(result)
    }

    async fn write_snapshot(&self, path: &Path) -> Result<(), SnapshotError> {
        let items: Vec<&T> = self.store.values().collect();
        let bytes = serde_json::to_vec_pretty(&items)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        info!(documents = items.len(), path = %path.display(), "Snapshot written");
        Ok(())
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R, T::Error>) -> ResourceRequest<T>,
    ) -> Result<R, T::Error> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, payload: T::CreatePayload) -> Result<T, T::Error> {
        self.request(|respond_to| ResourceRequest::Create { payload, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, T::Error> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, T::Error> {
        self.request(|respond_to| ResourceRequest::Update { id, patch, respond_to }).await
    }

    pub async fn perform_action(&self, id: T::Id, action: T::Action) -> Result<T::ActionResult, T::Error> {
        self.request(|respond_to| ResourceRequest::Action { id, action, respond_to }).await
    }

    pub async fn query(
        &self,
        filter: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<T>, T::Error> {
        let filter: Filter<T> = Box::new(filter);
        self.request(|respond_to| ResourceRequest::Query { filter, respond_to }).await
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    // --- Domain Definition ---

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct SimpleUser {
        id: String,
        name: String,
        is_admin: bool,
        joined_as: u64,
    }

    #[derive(Debug)]
    struct SimpleUserCreate {
        name: String,
    }

    #[derive(Debug)]
    struct SimpleUserPatch {
        name: Option<String>,
    }

    #[derive(Debug)]
    enum UserAction {
        PromoteToAdmin,
        Rename(String),
    }

    #[derive(Debug, Clone, Error, PartialEq)]
    enum SimpleError {
        #[error("framework: {0}")]
        Framework(#[from] FrameworkError),
        #[error("name must not be empty")]
        EmptyName,
    }

    impl Entity for SimpleUser {
        type Id = String;
        type CreatePayload = SimpleUserCreate;
        type Patch = SimpleUserPatch;
        type Action = UserAction;
        type ActionResult = bool;
        type Error = SimpleError;

        const COLLECTION: &'static str = "simple_users";

        fn id(&self) -> &String {
            &self.id
        }

        fn from_create(id: String, sequence: u64, payload: SimpleUserCreate) -> Result<Self, SimpleError> {
            if payload.name.is_empty() {
                return Err(SimpleError::EmptyName);
            }
            Ok(Self {
                id,
                name: payload.name,
                is_admin: false,
                joined_as: sequence,
            })
        }

        fn conflicts_with(&self, existing: &Self) -> bool {
            self.name == existing.name
        }

        fn on_update(&mut self, patch: SimpleUserPatch) -> Result<(), SimpleError> {
            if let Some(name) = patch.name {
                self.name = name;
            }
            Ok(())
        }

        fn handle_action(&mut self, action: UserAction) -> Result<bool, SimpleError> {
            match action {
                UserAction::PromoteToAdmin => {
                    if self.is_admin {
                        Ok(false)
                    } else {
                        self.is_admin = true;
                        Ok(true)
                    }
                }
                UserAction::Rename(new_name) => {
                    // Mutates before failing so the test can prove nothing is committed.
                    self.name = new_name;
                    if self.name.is_empty() {
                        return Err(SimpleError::EmptyName);
                    }
                    Ok(true)
                }
            }
        }
    }

    fn counter_ids() -> impl Fn() -> String + Send + Sync + 'static {
        let counter = Arc::new(AtomicU64::new(1));
        move || format!("user_{}", counter.fetch_add(1, Ordering::SeqCst))
    }

    fn start() -> ResourceClient<SimpleUser> {
        let (actor, client) = ResourceActor::new(10, counter_ids());
        tokio::spawn(actor.run());
        client
    }

    #[tokio::test]
    async fn test_resource_actor_with_actions() {
        let client = start();

        let user = client.create(SimpleUserCreate { name: "Alice".into() }).await.unwrap();
        assert_eq!(user.joined_as, 1);

        let changed = client.perform_action(user.id.clone(), UserAction::PromoteToAdmin).await.unwrap();
        assert!(changed);

        let stored = client.get(user.id.clone()).await.unwrap().unwrap();
        assert!(stored.is_admin);

        let changed_again = client.perform_action(user.id.clone(), UserAction::PromoteToAdmin).await.unwrap();
        assert!(!changed_again);
    }

    #[tokio::test]
    async fn test_failed_action_is_not_committed() {
        let client = start();
        let user = client.create(SimpleUserCreate { name: "Alice".into() }).await.unwrap();

        let result = client.perform_action(user.id.clone(), UserAction::Rename(String::new())).await;
        assert_eq!(result, Err(SimpleError::EmptyName));

        let stored = client.get(user.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Alice");
    }

    #[tokio::test]
    async fn test_unique_check_rejects_conflicting_create() {
        let client = start();
        client.create(SimpleUserCreate { name: "Alice".into() }).await.unwrap();

        let duplicate = client.create(SimpleUserCreate { name: "Alice".into() }).await;
        assert!(matches!(duplicate, Err(SimpleError::Framework(FrameworkError::Conflict(_)))));

        let bob = client.create(SimpleUserCreate { name: "Bob".into() }).await.unwrap();
        assert_eq!(bob.joined_as, 2, "rejected creates must not consume a sequence number");
    }

    #[tokio::test]
    async fn test_missing_item_reports_not_found() {
        let client = start();
        let result = client.update("nobody".into(), SimpleUserPatch { name: None }).await;
        assert_eq!(result, Err(SimpleError::Framework(FrameworkError::NotFound("nobody".into()))));
    }

    #[tokio::test]
    async fn test_query_filters_documents() {
        let client = start();
        for name in ["Alice", "Bob", "Carol"] {
            client.create(SimpleUserCreate { name: name.into() }).await.unwrap();
        }

        let mut found = client.query(|u: &SimpleUser| u.name.contains('o')).await.unwrap();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        let names: Vec<_> = found.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Carol"]);
    }

    #[tokio::test]
    async fn test_closed_actor_reports_communication_error() {
        let (actor, client) = ResourceActor::<SimpleUser>::new(1, counter_ids());
        drop(actor);
        let result = client.get("user_1".into()).await;
        assert_eq!(result, Err(SimpleError::Framework(FrameworkError::ActorClosed)));
    }

    #[tokio::test]
    async fn test_snapshot_survives_restart() {
        let path = std::env::temp_dir().join(format!("snapshot-{}.json", uuid::Uuid::new_v4()));

        let (actor, client) = ResourceActor::<SimpleUser>::new(10, counter_ids());
        let actor = actor.with_snapshot(&path).await.unwrap();
        let handle = tokio::spawn(actor.run());
        client.create(SimpleUserCreate { name: "Alice".into() }).await.unwrap();
        drop(client);
        handle.await.unwrap();

        let (actor, client) = ResourceActor::<SimpleUser>::new(10, || "user_next".to_string());
        let actor = actor.with_snapshot(&path).await.unwrap();
        tokio::spawn(actor.run());

        let restored = client.get("user_1".into()).await.unwrap().unwrap();
        assert_eq!(restored.name, "Alice");
        let next = client.create(SimpleUserCreate { name: "Bob".into() }).await.unwrap();
        assert_eq!(next.joined_as, 2);

        let _ = std::fs::remove_file(&path);
    }
}
