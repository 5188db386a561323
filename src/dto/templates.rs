use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::products::PublishStatus;
use crate::models::{Template, TemplateField};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TemplateFieldInput {
    pub label: String,
    pub field_type: String,
    pub order_index: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<PublishStatus>,
    #[serde(default)]
    pub fields: Vec<TemplateFieldInput>,
}

/// Updating `fields` replaces the field set wholesale; order_index values are
/// resequenced to stay dense and unique.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<PublishStatus>,
    pub fields: Option<Vec<TemplateFieldInput>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateWithCount {
    #[serde(flatten)]
    pub template: Template,
    #[serde(rename = "productCount")]
    pub product_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateDetail {
    #[serde(flatten)]
    pub template: Template,
    pub fields: Vec<TemplateField>,
    #[serde(rename = "productCount")]
    pub product_count: u64,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct TemplateList {
    #[schema(value_type = Vec<TemplateWithCount>)]
    pub items: Vec<TemplateWithCount>,
}
