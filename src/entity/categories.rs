use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The four ordered levels of the category hierarchy. Each lower tier carries
/// a parent reference to the tier above.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum CategoryTier {
    #[sea_orm(string_value = "primary")]
    Primary,
    #[sea_orm(string_value = "secondary")]
    Secondary,
    #[sea_orm(string_value = "tertiary")]
    Tertiary,
    #[sea_orm(string_value = "quaternary")]
    Quaternary,
}

impl CategoryTier {
    /// The tier a parent category must have, if a parent is required at all.
    pub fn parent_tier(self) -> Option<CategoryTier> {
        match self {
            CategoryTier::Primary => None,
            CategoryTier::Secondary => Some(CategoryTier::Primary),
            CategoryTier::Tertiary => Some(CategoryTier::Secondary),
            CategoryTier::Quaternary => Some(CategoryTier::Tertiary),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub name: String,
    pub tier: CategoryTier,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
}

impl ActiveModelBehavior for ActiveModel {}
