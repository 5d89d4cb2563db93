use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::actor_framework::{Entity, ResourceActor, ResourceClient, SnapshotError};
use crate::clients::{OrderClient, ProductClient, UserClient};
use crate::domain::{Order, Product, User};
use crate::notifications::Notifier;

const LIVE_NOTIFICATION_CAPACITY: usize = 64;

/// The main application system that orchestrates all actors.
///
/// Responsible for starting up actors, wiring them together, and handling shutdown.
pub struct MarketSystem {
    pub user_client: UserClient,
    pub product_client: ProductClient,
    pub order_client: OrderClient,
    pub notifier: Notifier,
    handles: Vec<JoinHandle<()>>,
}

async fn spawn_actor<T: Entity<Id = String>>(
    buffer: usize,
    data_dir: Option<&Path>,
) -> Result<(ResourceClient<T>, JoinHandle<()>), SnapshotError> {
    let (actor, client) = ResourceActor::<T>::new(buffer, || Uuid::new_v4().to_string());
    let actor = match data_dir {
        Some(dir) => actor.with_snapshot(dir.join(format!("{}.json", T::COLLECTION))).await?,
        None => actor,
    };
    Ok((client, tokio::spawn(actor.run())))
}

impl MarketSystem {
    /// Start the user, product and order actors. With `data_dir` set each
    /// collection is loaded from and saved back to a JSON snapshot there.
    pub async fn start(buffer: usize, data_dir: Option<&Path>) -> Result<Self, SnapshotError> {
        let (users, user_handle) = spawn_actor::<User>(buffer, data_dir).await?;
        let user_client = UserClient::new(users);

        let (products, product_handle) = spawn_actor::<Product>(buffer, data_dir).await?;
        let product_client = ProductClient::new(products);

        let notifier = Notifier::new(user_client.clone(), LIVE_NOTIFICATION_CAPACITY);

        let (orders, order_handle) = spawn_actor::<Order>(buffer, data_dir).await?;
        let order_client = OrderClient::new(
            orders,
            user_client.clone(),
            product_client.clone(),
            Arc::new(notifier.clone()),
        );

        info!(persistent = data_dir.is_some(), "Market system started");
        Ok(Self {
            user_client,
            product_client,
            order_client,
            notifier,
            handles: vec![user_handle, product_handle, order_handle],
        })
    }

    /// Close every mailbox and wait for the actors to write their snapshots.
    ///
    /// Clones of the clients held elsewhere (such as router state) must be
    /// dropped first, or the actors keep running.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        drop(self.order_client);
        drop(self.notifier);
        drop(self.product_client);
        drop(self.user_client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
