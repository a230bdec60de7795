use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Cart line resolved against the catalog.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartEntry {
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub session_id: String,
    pub items: Vec<CartEntry>,
}
