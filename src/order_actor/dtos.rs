// DTOs for Order
use serde::Deserialize;

use crate::domain::{OrderItem, PaymentMethod, ShippingAddress};

/// Payload for inserting an order once every line has been reserved.
///
/// `items` are the snapshots returned by the product actor, so prices are
/// the catalog prices at purchase time.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub buyer: String,
    pub seller: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub tax_price: f64,
    pub shipping_price: f64,
    pub notes: Option<String>,
}

/// One requested line: a product and how many units of it.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    pub product: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// A buyer's order request, before any stock is reserved.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    #[serde(default)]
    pub order_items: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub payment_info: PaymentRequest,
    #[serde(default)]
    pub tax_price: f64,
    #[serde(default)]
    pub shipping_price: f64,
    #[serde(default)]
    pub notes: Option<String>,
}
