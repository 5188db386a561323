use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Brand;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBrandRequest {
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBrandRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BrandWithCount {
    #[serde(flatten)]
    pub brand: Brand,
    #[serde(rename = "productCount")]
    pub product_count: u64,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct BrandList {
    #[schema(value_type = Vec<BrandWithCount>)]
    pub items: Vec<BrandWithCount>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn brand_row_serializes_product_count_camel_case() {
        let row = BrandWithCount {
            brand: Brand {
                id: Uuid::new_v4(),
                name: "Vaillant".into(),
                image_url: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            product_count: 3,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["productCount"], 3);
        assert!(json.get("product_count").is_none());
    }
}
