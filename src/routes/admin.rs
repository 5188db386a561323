use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};

use crate::{
    dto::inventory::{AdjustInventoryRequest, InventoryList},
    dto::orders::{OrderDetail, OrderList, UpdateOrderStatusRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Inventory, Order},
    response::ApiResponse,
    routes::params::{InventoryListParams, ListParams, parse_id},
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/inventory", get(list_inventory))
        .route("/inventory/{id}", patch(adjust_inventory))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<String>, Query, description = "Page number, default 1"),
        ("page_size" = Option<String>, Query, description = "Items per page, default 10, max 100"),
        ("filter_status" = Option<String>, Query, description = "Filter by order status"),
        ("sort_by" = Option<String>, Query, description = "created_at, updated_at, total_amount, status"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "All orders", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user, params).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items and customer", body = ApiResponse<OrderDetail>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let id = parse_id(&id)?;
    let resp = admin_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = String, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated with lifecycle date stamped", body = ApiResponse<Order>),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let id = parse_id(&id)?;
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/inventory",
    params(
        ("page" = Option<String>, Query, description = "Page number, default 1"),
        ("page_size" = Option<String>, Query, description = "Items per page, default 10, max 100"),
        ("search" = Option<String>, Query, description = "Match on product name"),
        ("low_stock" = Option<String>, Query, description = "true to keep only rows at or below their threshold"),
        ("sort_by" = Option<String>, Query, description = "updated_at, quantity"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "Inventory with products", body = ApiResponse<InventoryList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<InventoryListParams>,
) -> AppResult<Json<ApiResponse<InventoryList>>> {
    let low_stock = params.low_stock_only();
    let resp = admin_service::list_inventory(&state, &user, params.list, low_stock).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/inventory/{id}",
    params(("id" = String, Path, description = "Inventory ID")),
    request_body = AdjustInventoryRequest,
    responses(
        (status = 200, description = "Quantity adjusted, floored at zero", body = ApiResponse<Inventory>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Inventory row not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<AdjustInventoryRequest>,
) -> AppResult<Json<ApiResponse<Inventory>>> {
    let id = parse_id(&id)?;
    let resp = admin_service::adjust_inventory(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
