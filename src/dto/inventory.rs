use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Inventory, Product};

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryWithProduct {
    #[serde(flatten)]
    pub inventory: Inventory,
    pub product: Product,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct InventoryList {
    #[schema(value_type = Vec<InventoryWithProduct>)]
    pub items: Vec<InventoryWithProduct>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustInventoryRequest {
    pub delta: i32,
}
