use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    error::AppResult,
    middleware::auth::AuthUser,
    middleware::session::SESSION_COOKIE,
    response::ApiResponse,
    routes::params::{ListParams, parse_id},
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/checkout", post(checkout))
        .route("/{id}", get(get_order))
        .route("/{id}/pay", post(pay_order))
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Create an order from the current cart", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Empty cart or insufficient stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    jar: CookieJar,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    // Carry the session over so a pre-login cart is claimed before checkout.
    let session_id = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|s| !s.is_empty());
    let resp = order_service::checkout(&state, &user, session_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<String>, Query, description = "Page number, default 1"),
        ("page_size" = Option<String>, Query, description = "Items per page, default 10, max 100"),
        ("filter_status" = Option<String>, Query, description = "Filter by order status"),
        ("sort_by" = Option<String>, Query, description = "created_at, updated_at, total_amount, status"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "List the caller's orders", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, params).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not the caller's order"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let id = parse_id(&id)?;
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/pay",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Record payment", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Order already paid"),
        (status = 404, description = "Not the caller's order"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn pay_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let id = parse_id(&id)?;
    let resp = order_service::pay_order(&state, &user, id).await?;
    Ok(Json(resp))
}
