use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MilletType {
    #[serde(rename = "Foxtail Millet")]
    Foxtail,
    #[serde(rename = "Pearl Millet")]
    Pearl,
    #[serde(rename = "Finger Millet")]
    Finger,
    #[serde(rename = "Little Millet")]
    Little,
    #[serde(rename = "Kodo Millet")]
    Kodo,
    #[serde(rename = "Proso Millet")]
    Proso,
    #[serde(rename = "Barnyard Millet")]
    Barnyard,
    Sorghum,
    Other,
}

impl MilletType {
    pub fn label(self) -> &'static str {
        match self {
            MilletType::Foxtail => "Foxtail Millet",
            MilletType::Pearl => "Pearl Millet",
            MilletType::Finger => "Finger Millet",
            MilletType::Little => "Little Millet",
            MilletType::Kodo => "Kodo Millet",
            MilletType::Proso => "Proso Millet",
            MilletType::Barnyard => "Barnyard Millet",
            MilletType::Sorghum => "Sorghum",
            MilletType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Raw Grain")]
    RawGrain,
    Flour,
    #[serde(rename = "Ready-to-Cook")]
    ReadyToCook,
    Snacks,
    Processed,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Kg,
    Gram,
    Quintal,
    Ton,
    Piece,
    Packet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellerType {
    Farmer,
    Processor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub public_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub name: String,
    #[serde(default)]
    pub document_url: Option<String>,
    #[serde(default)]
    pub issue_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionalInfo {
    pub protein: Option<f64>,
    pub fiber: Option<f64>,
    pub iron: Option<f64>,
    pub calcium: Option<f64>,
    pub calories: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user: String,
    pub name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Represents a millet product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub millet_type: MilletType,
    pub category: Category,
    pub price: f64,
    pub unit: Unit,
    /// Units currently in stock.
    pub quantity: u32,
    pub min_order_quantity: u32,
    pub images: Vec<ProductImage>,
    pub seller: String,
    pub seller_type: SellerType,
    pub certifications: Vec<Certification>,
    pub is_verified: bool,
    pub verification_status: VerificationStatus,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub location: Location,
    /// Average of `reviews[].rating`, 0 when there are no reviews.
    pub rating: f64,
    pub num_reviews: u32,
    pub reviews: Vec<Review>,
    pub nutritional_info: NutritionalInfo,
    pub benefits: Vec<String>,
    pub storage: Option<String>,
    pub shelf_life: Option<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub sold_count: u64,
    pub view_count: u64,
    pub wishlist_count: u64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Only active, admin-approved listings can be bought.
    pub fn is_purchasable(&self) -> bool {
        self.is_active && self.is_verified && self.verification_status == VerificationStatus::Approved
    }

    /// Recompute `rating` and `num_reviews` from the review list.
    pub fn refresh_rating(&mut self) {
        self.num_reviews = self.reviews.len() as u32;
        self.rating = if self.reviews.is_empty() {
            0.0
        } else {
            let sum: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
            f64::from(sum) / f64::from(self.num_reviews)
        };
    }

    /// Case-insensitive match over name, description and millet type.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.millet_type.label().to_lowercase().contains(&needle)
    }
}
