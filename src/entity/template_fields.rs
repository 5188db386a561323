use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "template_fields")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub template_id: Uuid,
    pub label: String,
    pub field_type: String,
    /// Display and storage order within the template; unique per template.
    pub order_index: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::templates::Entity",
        from = "Column::TemplateId",
        to = "super::templates::Column::Id"
    )]
    Templates,
    #[sea_orm(has_many = "super::product_field_values::Entity")]
    ProductFieldValues,
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

impl ActiveModelBehavior for ActiveModel {}
