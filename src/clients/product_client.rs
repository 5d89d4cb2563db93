use chrono::Utc;
use tracing::{debug, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{Product, ProductImage, Requester, Review, VerificationStatus};
use crate::product_actor::{
    ProductAction, ProductActionResult, ProductCreate, ProductError, ProductPatch, Reservation,
};

/// Client for interacting with the Product actor.
#[derive(Clone)]
pub struct ProductClient {
    inner: ResourceClient<Product>,
}

impl_basic_client!(ProductClient, Product, ProductError, product);

fn expect_updated(result: ProductActionResult) -> Result<Product, ProductError> {
    match result {
        ProductActionResult::Updated(product) => Ok(product),
        ProductActionResult::Reserved(_) => {
            Err(ProductError::ActorCommunicationError("Unexpected result".to_string()))
        }
    }
}

impl ProductClient {
    #[instrument(skip(self, payload), fields(seller = %payload.seller))]
    pub async fn create_product(&self, payload: ProductCreate) -> Result<Product, ProductError> {
        debug!("Sending request");
        self.inner.create(payload).await
    }

    #[instrument(skip(self, patch), fields(editor = %patch.editor.user_id))]
    pub async fn update_product(&self, id: String, patch: ProductPatch) -> Result<Product, ProductError> {
        debug!("Sending request");
        self.inner.update(id, patch).await
    }

    pub async fn list_products(
        &self,
        filter: impl Fn(&Product) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<Product>, ProductError> {
        self.inner.query(filter).await
    }

    /// Atomically take `quantity` units of stock.
    #[instrument(skip(self))]
    pub async fn reserve(&self, id: String, quantity: u32) -> Result<Reservation, ProductError> {
        debug!("Sending request");
        match self.inner.perform_action(id, ProductAction::Reserve { quantity }).await? {
            ProductActionResult::Reserved(reservation) => Ok(reservation),
            ProductActionResult::Updated(_) => {
                Err(ProductError::ActorCommunicationError("Unexpected result".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn release(&self, id: String, quantity: u32) -> Result<Product, ProductError> {
        debug!("Sending request");
        expect_updated(self.inner.perform_action(id, ProductAction::Release { quantity }).await?)
    }

    #[instrument(skip(self))]
    pub async fn record_view(&self, id: String) -> Result<Product, ProductError> {
        expect_updated(self.inner.perform_action(id, ProductAction::RecordView).await?)
    }

    #[instrument(skip(self))]
    pub async fn verify(
        &self,
        id: String,
        decision: VerificationStatus,
        admin_id: String,
        rejection_reason: Option<String>,
    ) -> Result<Product, ProductError> {
        debug!("Sending request");
        let action = ProductAction::Verify { decision, admin_id, rejection_reason, at: Utc::now() };
        expect_updated(self.inner.perform_action(id, action).await?)
    }

    #[instrument(skip(self, review), fields(reviewer = %review.user))]
    pub async fn add_review(&self, id: String, review: Review) -> Result<Product, ProductError> {
        expect_updated(self.inner.perform_action(id, ProductAction::AddReview(review)).await?)
    }

    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: String, requester: Requester) -> Result<Product, ProductError> {
        expect_updated(self.inner.perform_action(id, ProductAction::Deactivate { requester }).await?)
    }

    #[instrument(skip(self, images))]
    pub async fn add_images(
        &self,
        id: String,
        requester: Requester,
        images: Vec<ProductImage>,
    ) -> Result<Product, ProductError> {
        expect_updated(self.inner.perform_action(id, ProductAction::AddImages { requester, images }).await?)
    }
}
