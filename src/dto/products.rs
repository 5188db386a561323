use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::products::PublishStatus;
use crate::models::{Brand, Category, Inventory, Product, Template, TemplateField};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<PublishStatus>,
    pub price: i64,
    pub compare_at_price: Option<i64>,
    #[serde(default)]
    pub images: Vec<String>,
    pub brand_id: Option<Uuid>,
    pub primary_category_id: Option<Uuid>,
    pub secondary_category_id: Option<Uuid>,
    pub tertiary_category_id: Option<Uuid>,
    pub quaternary_category_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    #[serde(default)]
    pub field_values: Vec<FieldValueInput>,
    pub initial_quantity: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<PublishStatus>,
    pub price: Option<i64>,
    pub compare_at_price: Option<i64>,
    pub images: Option<Vec<String>>,
    pub brand_id: Option<Uuid>,
    pub primary_category_id: Option<Uuid>,
    pub secondary_category_id: Option<Uuid>,
    pub tertiary_category_id: Option<Uuid>,
    pub quaternary_category_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub field_values: Option<Vec<FieldValueInput>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FieldValueInput {
    pub template_field_id: Uuid,
    pub value: String,
}

/// A template field paired with this product's stored value, ordered by the
/// field's order_index.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResolvedField {
    #[serde(flatten)]
    pub field: TemplateField,
    pub value: Option<String>,
}

/// Fully-joined product view: brand, the four category tiers, the template
/// with its ordered fields and this product's values, and inventory.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub brand: Option<Brand>,
    pub primary_category: Option<Category>,
    pub secondary_category: Option<Category>,
    pub tertiary_category: Option<Category>,
    pub quaternary_category: Option<Category>,
    pub template: Option<Template>,
    pub fields: Vec<ResolvedField>,
    pub inventory: Option<Inventory>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
