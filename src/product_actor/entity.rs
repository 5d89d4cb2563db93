use chrono::Utc;
use validator::Validate;

use crate::actor_framework::Entity;
use crate::domain::{OrderItem, Product, VerificationStatus};
use super::actions::{ProductAction, ProductActionResult, Reservation};
use super::dtos::{ProductCreate, ProductPatch};
use super::error::ProductError;

impl Entity for Product {
    type Id = String;
    type CreatePayload = ProductCreate;
    type Patch = ProductPatch;
    type Action = ProductAction;
    type ActionResult = ProductActionResult;
    type Error = ProductError;

    const COLLECTION: &'static str = "products";

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new listing awaiting admin verification.
    fn from_create(id: String, _sequence: u64, params: ProductCreate) -> Result<Self, ProductError> {
        params
            .draft
            .validate()
            .map_err(|e| ProductError::ValidationError(e.to_string()))?;
        let draft = params.draft;
        let now = Utc::now();
        Ok(Self {
            id,
            name: draft.name.trim().to_string(),
            description: draft.description,
            millet_type: draft.millet_type,
            category: draft.category,
            price: draft.price,
            unit: draft.unit,
            quantity: draft.quantity,
            min_order_quantity: draft.min_order_quantity,
            images: Vec::new(),
            seller: params.seller,
            seller_type: params.seller_type,
            certifications: draft.certifications,
            is_verified: false,
            verification_status: VerificationStatus::Pending,
            verified_by: None,
            verified_at: None,
            rejection_reason: None,
            location: draft.location,
            rating: 0.0,
            num_reviews: 0,
            reviews: Vec::new(),
            nutritional_info: draft.nutritional_info,
            benefits: draft.benefits,
            storage: draft.storage,
            shelf_life: draft.shelf_life,
            is_featured: false,
            is_active: true,
            sold_count: 0,
            view_count: 0,
            wishlist_count: 0,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies an edit by the owner or an admin.
    ///
    /// A non-admin edit sends any reviewed listing back to `pending`, so
    /// changed listings are re-reviewed before buyers see them again.
    fn on_update(&mut self, patch: ProductPatch) -> Result<(), ProductError> {
        let ProductPatch { editor, changes } = patch;
        if !editor.may_manage(&self.seller) {
            return Err(ProductError::Forbidden("update"));
        }
        changes
            .validate()
            .map_err(|e| ProductError::ValidationError(e.to_string()))?;

        if let Some(name) = changes.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(millet_type) = changes.millet_type {
            self.millet_type = millet_type;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(unit) = changes.unit {
            self.unit = unit;
        }
        if let Some(quantity) = changes.quantity {
            self.quantity = quantity;
        }
        if let Some(minimum) = changes.min_order_quantity {
            self.min_order_quantity = minimum;
        }
        if let Some(certifications) = changes.certifications {
            self.certifications = certifications;
        }
        if let Some(location) = changes.location {
            self.location = location;
        }
        if let Some(info) = changes.nutritional_info {
            self.nutritional_info = info;
        }
        if let Some(benefits) = changes.benefits {
            self.benefits = benefits;
        }
        if changes.storage.is_some() {
            self.storage = changes.storage;
        }
        if changes.shelf_life.is_some() {
            self.shelf_life = changes.shelf_life;
        }
        if let Some(tags) = changes.tags {
            self.tags = tags;
        }

        if editor.is_admin() {
            if let Some(featured) = changes.is_featured {
                self.is_featured = featured;
            }
        } else if self.verification_status != VerificationStatus::Pending {
            self.verification_status = VerificationStatus::Pending;
            self.is_verified = false;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    fn handle_action(&mut self, action: ProductAction) -> Result<ProductActionResult, ProductError> {
        match action {
            ProductAction::Reserve { quantity } => {
                if !self.is_purchasable() {
                    return Err(ProductError::NotPurchasable(self.id.clone()));
                }
                if quantity == 0 {
                    return Err(ProductError::InvalidQuantity(quantity));
                }
                if quantity < self.min_order_quantity {
                    return Err(ProductError::BelowMinimumOrder {
                        requested: quantity,
                        minimum: self.min_order_quantity,
                    });
                }
                if quantity > self.quantity {
                    return Err(ProductError::InsufficientStock {
                        requested: quantity,
                        available: self.quantity,
                    });
                }
                self.quantity -= quantity;
                self.sold_count += u64::from(quantity);
                self.updated_at = Utc::now();
                return Ok(ProductActionResult::Reserved(Reservation {
                    item: OrderItem {
                        product: self.id.clone(),
                        name: self.name.clone(),
                        quantity,
                        unit: self.unit,
                        price: self.price,
                        image: self.images.first().map(|image| image.url.clone()),
                        millet_type: self.millet_type,
                    },
                    seller: self.seller.clone(),
                }));
            }
            ProductAction::Release { quantity } => {
                self.quantity = self
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| ProductError::ValidationError("Released stock exceeds the quantity limit".into()))?;
                self.sold_count = self.sold_count.saturating_sub(u64::from(quantity));
            }
            ProductAction::RecordView => {
                self.view_count += 1;
            }
            ProductAction::Verify { decision, admin_id, rejection_reason, at } => {
                match decision {
                    VerificationStatus::Approved => {
                        self.is_verified = true;
                        self.rejection_reason = None;
                    }
                    VerificationStatus::Rejected => {
                        self.is_verified = false;
                        self.rejection_reason = rejection_reason;
                    }
                    VerificationStatus::Pending => {
                        return Err(ProductError::ValidationError(
                            "Verification status must be approved or rejected".into(),
                        ));
                    }
                }
                self.verification_status = decision;
                self.verified_by = Some(admin_id);
                self.verified_at = Some(at);
            }
            ProductAction::AddReview(review) => {
                if !(1..=5).contains(&review.rating) {
                    return Err(ProductError::ValidationError("Rating must be between 1 and 5".into()));
                }
                if self.reviews.iter().any(|r| r.user == review.user) {
                    return Err(ProductError::AlreadyReviewed);
                }
                self.reviews.push(review);
                self.refresh_rating();
            }
            ProductAction::Deactivate { requester } => {
                if !requester.may_manage(&self.seller) {
                    return Err(ProductError::Forbidden("delete"));
                }
                self.is_active = false;
            }
            ProductAction::AddImages { requester, images } => {
                if !requester.may_manage(&self.seller) {
                    return Err(ProductError::Forbidden("update"));
                }
                self.images.extend(images);
            }
        }
        self.updated_at = Utc::now();
        Ok(ProductActionResult::Updated(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, MilletType, Requester, Review, Role, SellerType, Unit};
    use crate::product_actor::{ProductChanges, ProductDraft};

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Organic Foxtail Millet".into(),
            description: "Premium quality foxtail millet".into(),
            millet_type: MilletType::Foxtail,
            category: Category::RawGrain,
            price: 120.0,
            unit: Unit::Kg,
            quantity: 500,
            min_order_quantity: 1,
            certifications: Vec::new(),
            location: Default::default(),
            nutritional_info: Default::default(),
            benefits: Vec::new(),
            storage: None,
            shelf_life: None,
            tags: Vec::new(),
        }
    }

    fn product() -> Product {
        Product::from_create(
            "product_1".into(),
            1,
            ProductCreate { seller: "farmer_1".into(), seller_type: SellerType::Farmer, draft: draft() },
        )
        .unwrap()
    }

    fn approved() -> Product {
        let mut product = product();
        product
            .handle_action(ProductAction::Verify {
                decision: VerificationStatus::Approved,
                admin_id: "admin_1".into(),
                rejection_reason: None,
                at: Utc::now(),
            })
            .unwrap();
        product
    }

    fn owner() -> Requester {
        Requester { user_id: "farmer_1".into(), role: Role::Farmer }
    }

    fn review(user: &str, rating: u8) -> Review {
        Review { user: user.into(), name: user.into(), rating, comment: None, created_at: Utc::now() }
    }

    #[test]
    fn test_new_product_awaits_verification() {
        let product = product();
        assert_eq!(product.verification_status, VerificationStatus::Pending);
        assert!(!product.is_verified);
        assert!(!product.is_purchasable());
    }

    #[test]
    fn test_invalid_draft_is_rejected() {
        let mut bad = draft();
        bad.name = String::new();
        let result = Product::from_create(
            "p".into(),
            1,
            ProductCreate { seller: "s".into(), seller_type: SellerType::Farmer, draft: bad },
        );
        assert!(matches!(result, Err(ProductError::ValidationError(_))));
    }

    #[test]
    fn test_reserve_requires_approval() {
        let mut product = product();
        let result = product.handle_action(ProductAction::Reserve { quantity: 1 });
        assert_eq!(result.unwrap_err(), ProductError::NotPurchasable("product_1".into()));
    }

    #[test]
    fn test_reserve_decrements_stock_and_counts_sales() {
        let mut product = approved();
        match product.handle_action(ProductAction::Reserve { quantity: 20 }).unwrap() {
            ProductActionResult::Reserved(reservation) => {
                assert_eq!(reservation.item.quantity, 20);
                assert_eq!(reservation.item.price, 120.0);
                assert_eq!(reservation.seller, "farmer_1");
            }
            other => panic!("Unexpected result: {:?}", other),
        }
        assert_eq!(product.quantity, 480);
        assert_eq!(product.sold_count, 20);
    }

    #[test]
    fn test_reserve_never_oversells() {
        let mut product = approved();
        let result = product.handle_action(ProductAction::Reserve { quantity: 501 });
        assert_eq!(result.unwrap_err(), ProductError::InsufficientStock { requested: 501, available: 500 });
        assert_eq!(product.quantity, 500);
    }

    #[test]
    fn test_release_restores_stock() {
        let mut product = approved();
        product.handle_action(ProductAction::Reserve { quantity: 5 }).unwrap();
        product.handle_action(ProductAction::Release { quantity: 5 }).unwrap();
        assert_eq!(product.quantity, 500);
        assert_eq!(product.sold_count, 0);
    }

    #[test]
    fn test_stock_edit_is_capped() {
        let mut product = approved();
        let changes = ProductChanges { quantity: Some(u32::MAX), ..ProductChanges::default() };
        let result = product.on_update(ProductPatch { editor: owner(), changes });
        assert!(matches!(result, Err(ProductError::ValidationError(_))));

        let mut bad = draft();
        bad.quantity = u32::MAX;
        let result = Product::from_create(
            "p".into(),
            1,
            ProductCreate { seller: "s".into(), seller_type: SellerType::Farmer, draft: bad },
        );
        assert!(matches!(result, Err(ProductError::ValidationError(_))));
    }

    #[test]
    fn test_release_past_u32_max_is_rejected() {
        let mut product = approved();
        product.handle_action(ProductAction::Reserve { quantity: 5 }).unwrap();
        product.quantity = u32::MAX;
        let result = product.handle_action(ProductAction::Release { quantity: 5 });
        assert!(matches!(result, Err(ProductError::ValidationError(_))));
        assert_eq!(product.quantity, u32::MAX);
        assert_eq!(product.sold_count, 5);
    }

    #[test]
    fn test_owner_edit_of_verified_product_requeues_review() {
        let mut product = approved();
        let changes = ProductChanges { price: Some(130.0), ..ProductChanges::default() };
        product.on_update(ProductPatch { editor: owner(), changes }).unwrap();
        assert_eq!(product.price, 130.0);
        assert_eq!(product.verification_status, VerificationStatus::Pending);
        assert!(!product.is_verified);
    }

    #[test]
    fn test_admin_edit_keeps_verification() {
        let mut product = approved();
        let admin = Requester { user_id: "admin_1".into(), role: Role::Admin };
        let changes = ProductChanges { is_featured: Some(true), ..ProductChanges::default() };
        product.on_update(ProductPatch { editor: admin, changes }).unwrap();
        assert!(product.is_verified);
        assert!(product.is_featured);
    }

    #[test]
    fn test_stranger_cannot_edit_or_delete() {
        let mut product = approved();
        let stranger = Requester { user_id: "farmer_2".into(), role: Role::Farmer };
        let patch = ProductPatch { editor: stranger.clone(), changes: ProductChanges::default() };
        assert_eq!(product.on_update(patch), Err(ProductError::Forbidden("update")));
        let result = product.handle_action(ProductAction::Deactivate { requester: stranger });
        assert_eq!(result.unwrap_err(), ProductError::Forbidden("delete"));
    }

    #[test]
    fn test_rating_is_average_of_reviews() {
        let mut product = approved();
        product.handle_action(ProductAction::AddReview(review("c1", 5))).unwrap();
        product.handle_action(ProductAction::AddReview(review("c2", 2))).unwrap();
        assert_eq!(product.num_reviews, 2);
        assert!((product.rating - 3.5).abs() < f64::EPSILON);

        let again = product.handle_action(ProductAction::AddReview(review("c1", 4)));
        assert_eq!(again.unwrap_err(), ProductError::AlreadyReviewed);
    }

    #[test]
    fn test_rejection_records_reason() {
        let mut product = product();
        product
            .handle_action(ProductAction::Verify {
                decision: VerificationStatus::Rejected,
                admin_id: "admin_1".into(),
                rejection_reason: Some("Blurry photos".into()),
                at: Utc::now(),
            })
            .unwrap();
        assert_eq!(product.verification_status, VerificationStatus::Rejected);
        assert_eq!(product.rejection_reason.as_deref(), Some("Blurry photos"));
        assert_eq!(product.verified_by.as_deref(), Some("admin_1"));
    }
}
