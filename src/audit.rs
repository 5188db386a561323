use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Audit action vocabulary. Services log through these constants so the
/// `action` column stays a closed set.
pub mod action {
    pub const USER_REGISTER: &str = "user_register";
    pub const USER_LOGIN: &str = "user_login";
    pub const PASSWORD_RESET: &str = "password_reset";
    pub const BRAND_CREATE: &str = "brand_create";
    pub const BRAND_UPDATE: &str = "brand_update";
    pub const BRAND_DELETE: &str = "brand_delete";
    pub const CATEGORY_CREATE: &str = "category_create";
    pub const CATEGORY_UPDATE: &str = "category_update";
    pub const CATEGORY_DELETE: &str = "category_delete";
    pub const TEMPLATE_CREATE: &str = "template_create";
    pub const TEMPLATE_UPDATE: &str = "template_update";
    pub const TEMPLATE_DELETE: &str = "template_delete";
    pub const PRODUCT_CREATE: &str = "product_create";
    pub const PRODUCT_UPDATE: &str = "product_update";
    pub const PRODUCT_ARCHIVE: &str = "product_archive";
    pub const CART_UPDATE: &str = "cart_update";
    pub const CHECKOUT: &str = "checkout";
    pub const ORDER_PAID: &str = "order_paid";
    pub const ORDER_STATUS_UPDATED: &str = "order_status_updated";
    pub const INVENTORY_ADJUSTED: &str = "inventory_adjusted";
}

/// Insert one audit row. Callers treat failures as best-effort: the action
/// already succeeded, so an audit error is logged, never surfaced.
pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO audit_logs (id, user_id, action, resource, metadata) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action)
    .bind(resource)
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}
