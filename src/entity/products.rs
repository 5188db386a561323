use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status shared by products and templates. Products are archived
/// rather than hard-deleted.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PublishStatus {
    #[sea_orm(string_value = "ACTIVE")]
    #[serde(rename = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "DRAFT")]
    #[serde(rename = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "ARCHIVED")]
    #[serde(rename = "ARCHIVED")]
    Archived,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: PublishStatus,
    pub price: i64,
    pub compare_at_price: Option<i64>,
    pub images: Json,
    pub brand_id: Option<Uuid>,
    pub primary_category_id: Option<Uuid>,
    pub secondary_category_id: Option<Uuid>,
    pub tertiary_category_id: Option<Uuid>,
    pub quaternary_category_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brands::Entity",
        from = "Column::BrandId",
        to = "super::brands::Column::Id"
    )]
    Brands,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::PrimaryCategoryId",
        to = "super::categories::Column::Id"
    )]
    PrimaryCategory,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::SecondaryCategoryId",
        to = "super::categories::Column::Id"
    )]
    SecondaryCategory,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::TertiaryCategoryId",
        to = "super::categories::Column::Id"
    )]
    TertiaryCategory,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::QuaternaryCategoryId",
        to = "super::categories::Column::Id"
    )]
    QuaternaryCategory,
    #[sea_orm(
        belongs_to = "super::templates::Entity",
        from = "Column::TemplateId",
        to = "super::templates::Column::Id"
    )]
    Templates,
    #[sea_orm(has_many = "super::product_field_values::Entity")]
    ProductFieldValues,
    #[sea_orm(has_one = "super::inventories::Entity")]
    Inventories,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::brands::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brands.def()
    }
}

impl Related<super::templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Templates.def()
    }
}

impl Related<super::product_field_values::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductFieldValues.def()
    }
}

impl Related<super::inventories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventories.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
