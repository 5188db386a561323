use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity;
use crate::entity::categories::CategoryTier;
use crate::entity::products::PublishStatus;

/// Public view of a user; the password hash never leaves the service layer.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub tier: CategoryTier,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: PublishStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateField {
    pub id: Uuid,
    pub template_id: Uuid,
    pub label: String,
    pub field_type: String,
    pub order_index: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: PublishStatus,
    pub price: i64,
    pub compare_at_price: Option<i64>,
    pub images: Vec<String>,
    pub brand_id: Option<Uuid>,
    pub primary_category_id: Option<Uuid>,
    pub secondary_category_id: Option<Uuid>,
    pub tertiary_category_id: Option<Uuid>,
    pub quaternary_category_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Inventory {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub low_stock_threshold: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub payment_status: String,
    pub total_amount: i64,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_date: Option<DateTime<Utc>>,
    pub shipping_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub refund_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub price: i64,
    pub quantity: i32,
}

impl From<entity::users::Model> for User {
    fn from(model: entity::users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::brands::Model> for Brand {
    fn from(model: entity::brands::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            image_url: model.image_url,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::categories::Model> for Category {
    fn from(model: entity::categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            tier: model.tier,
            parent_id: model.parent_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::templates::Model> for Template {
    fn from(model: entity::templates::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::template_fields::Model> for TemplateField {
    fn from(model: entity::template_fields::Model) -> Self {
        Self {
            id: model.id,
            template_id: model.template_id,
            label: model.label,
            field_type: model.field_type,
            order_index: model.order_index,
        }
    }
}

impl From<entity::products::Model> for Product {
    fn from(model: entity::products::Model) -> Self {
        let images = serde_json::from_value(model.images).unwrap_or_default();
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            status: model.status,
            price: model.price,
            compare_at_price: model.compare_at_price,
            images,
            brand_id: model.brand_id,
            primary_category_id: model.primary_category_id,
            secondary_category_id: model.secondary_category_id,
            tertiary_category_id: model.tertiary_category_id,
            quaternary_category_id: model.quaternary_category_id,
            template_id: model.template_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::inventories::Model> for Inventory {
    fn from(model: entity::inventories::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            quantity: model.quantity,
            low_stock_threshold: model.low_stock_threshold,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::orders::Model> for Order {
    fn from(model: entity::orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            status: model.status,
            payment_status: model.payment_status,
            total_amount: model.total_amount,
            shipping_address: model.shipping_address,
            billing_address: model.billing_address,
            payment_date: model.payment_date.map(|dt| dt.with_timezone(&Utc)),
            shipping_date: model.shipping_date.map(|dt| dt.with_timezone(&Utc)),
            delivery_date: model.delivery_date.map(|dt| dt.with_timezone(&Utc)),
            refund_date: model.refund_date.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<entity::order_items::Model> for OrderItem {
    fn from(model: entity::order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: model.product_name,
            price: model.price,
            quantity: model.quantity,
        }
    }
}
