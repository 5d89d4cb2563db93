// DTOs for Product
use serde::Deserialize;
use validator::Validate;

use crate::domain::{
    Category, Certification, Location, MilletType, NutritionalInfo, Requester, SellerType, Unit,
};

fn one() -> u32 {
    1
}

/// Seller-supplied listing fields, as accepted from the API.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[validate(length(min = 1, max = 100, message = "Product name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 2000, message = "Description must be 1-2000 characters"))]
    pub description: String,
    pub millet_type: MilletType,
    pub category: Category,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    #[serde(default)]
    pub unit: Unit,
    #[validate(range(max = 1_000_000_000, message = "Quantity cannot exceed 1000000000"))]
    pub quantity: u32,
    #[serde(default = "one")]
    #[validate(range(min = 1, message = "Minimum order quantity must be at least 1"))]
    pub min_order_quantity: u32,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub nutritional_info: NutritionalInfo,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default)]
    pub shelf_life: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub seller: String,
    pub seller_type: SellerType,
    pub draft: ProductDraft,
}

/// Editable listing fields; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductChanges {
    #[validate(length(min = 1, max = 100, message = "Product name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "Description must be 1-2000 characters"))]
    pub description: Option<String>,
    pub millet_type: Option<MilletType>,
    pub category: Option<Category>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
    pub unit: Option<Unit>,
    #[validate(range(max = 1_000_000_000, message = "Quantity cannot exceed 1000000000"))]
    pub quantity: Option<u32>,
    #[validate(range(min = 1, message = "Minimum order quantity must be at least 1"))]
    pub min_order_quantity: Option<u32>,
    pub certifications: Option<Vec<Certification>>,
    pub location: Option<Location>,
    pub nutritional_info: Option<NutritionalInfo>,
    pub benefits: Option<Vec<String>>,
    pub storage: Option<String>,
    pub shelf_life: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Honored for admins only.
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ProductPatch {
    pub editor: Requester,
    pub changes: ProductChanges,
}
