use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    dto::cart::{AddCartItemRequest, CartView, UpdateCartItemRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    middleware::session::{CartIdentity, session_from_jar},
    response::ApiResponse,
    routes::params::parse_id,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart).post(add_item))
        .route("/items/{id}", axum::routing::put(update_item).delete(remove_item))
}

// Every cart handler resolves identity the same way: a session cookie is
// minted on first contact so even an anonymous browser gets a stable cart,
// and a logged-in caller keeps both identities until checkout merges them.
fn resolve_identity(
    state: &AppState,
    jar: CookieJar,
    user: Option<&AuthUser>,
) -> AppResult<(CookieJar, CartIdentity)> {
    let (jar, session_id) = session_from_jar(jar, state.config.production);
    let identity = CartIdentity::from_parts(user.map(|u| u.user_id), Some(session_id))?;
    Ok((jar, identity))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current cart with lines and subtotal", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    jar: CookieJar,
    user: Option<AuthUser>,
) -> AppResult<(CookieJar, Json<ApiResponse<CartView>>)> {
    let (jar, identity) = resolve_identity(&state, jar, user.as_ref())?;
    let resp = cart_service::view_cart(&state, &identity).await?;
    Ok((jar, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Add or replace a cart line", body = ApiResponse<CartView>),
        (status = 400, description = "Unknown inventory item or non-positive quantity"),
    ),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    jar: CookieJar,
    user: Option<AuthUser>,
    Json(payload): Json<AddCartItemRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<CartView>>)> {
    let (jar, identity) = resolve_identity(&state, jar, user.as_ref())?;
    let resp = cart_service::add_item(&state, &identity, payload).await?;
    Ok((jar, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/cart/items/{id}",
    params(("id" = String, Path, description = "Cart item ID")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Update line quantity", body = ApiResponse<CartView>),
        (status = 404, description = "Line not in this cart"),
    ),
    tag = "Cart"
)]
pub async fn update_item(
    State(state): State<AppState>,
    jar: CookieJar,
    user: Option<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<CartView>>)> {
    let item_id = parse_id(&id)?;
    let (jar, identity) = resolve_identity(&state, jar, user.as_ref())?;
    let resp = cart_service::update_item(&state, &identity, item_id, payload).await?;
    Ok((jar, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{id}",
    params(("id" = String, Path, description = "Cart item ID")),
    responses(
        (status = 200, description = "Remove a cart line", body = ApiResponse<CartView>),
        (status = 404, description = "Line not in this cart"),
    ),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    jar: CookieJar,
    user: Option<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<(CookieJar, Json<ApiResponse<CartView>>)> {
    let item_id = parse_id(&id)?;
    let (jar, identity) = resolve_identity(&state, jar, user.as_ref())?;
    let resp = cart_service::remove_item(&state, &identity, item_id).await?;
    Ok((jar, Json(resp)))
}
