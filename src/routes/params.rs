use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub use crate::query::ListParams;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductListParams {
    #[serde(flatten)]
    pub list: ListParams,
    pub primary_category_id: Option<Uuid>,
    pub secondary_category_id: Option<Uuid>,
    pub tertiary_category_id: Option<Uuid>,
    pub quaternary_category_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CategoryListParams {
    #[serde(flatten)]
    pub list: ListParams,
    pub tier: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InventoryListParams {
    #[serde(flatten)]
    pub list: ListParams,
    pub low_stock: Option<String>,
}

impl InventoryListParams {
    pub fn low_stock_only(&self) -> bool {
        matches!(self.low_stock.as_deref(), Some("true") | Some("1"))
    }
}

/// Detail routes take the id as a raw string so a malformed UUID maps to 400
/// rather than an extractor rejection.
pub fn parse_id(raw: &str) -> Result<Uuid, crate::error::AppError> {
    raw.trim()
        .parse()
        .map_err(|_| crate::error::AppError::BadRequest(format!("Invalid id: {raw}")))
}
