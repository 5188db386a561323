use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::brands::{BrandList, BrandWithCount, CreateBrandRequest, UpdateBrandRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Brand,
    response::ApiResponse,
    routes::params::{ListParams, parse_id},
    services::brand_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands).post(create_brand))
        .route(
            "/{id}",
            get(get_brand).put(update_brand).delete(delete_brand),
        )
}

#[utoipa::path(
    get,
    path = "/api/brands",
    params(
        ("page" = Option<String>, Query, description = "Page number, default 1"),
        ("page_size" = Option<String>, Query, description = "Items per page, default 10, max 100"),
        ("search" = Option<String>, Query, description = "Case-insensitive name match"),
        ("sort_by" = Option<String>, Query, description = "name, created_at, updated_at"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "List brands", body = ApiResponse<BrandList>)
    ),
    tag = "Brands"
)]
pub async fn list_brands(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<BrandList>>> {
    let resp = brand_service::list_brands(&state, params).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/brands/{id}",
    params(("id" = String, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Get brand", body = ApiResponse<BrandWithCount>),
        (status = 400, description = "Malformed ID"),
        (status = 404, description = "Brand not found"),
    ),
    tag = "Brands"
)]
pub async fn get_brand(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<BrandWithCount>>> {
    let id = parse_id(&id)?;
    let resp = brand_service::get_brand(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/brands",
    request_body = CreateBrandRequest,
    responses(
        (status = 200, description = "Create brand", body = ApiResponse<Brand>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Brands"
)]
pub async fn create_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBrandRequest>,
) -> AppResult<Json<ApiResponse<Brand>>> {
    let resp = brand_service::create_brand(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/brands/{id}",
    params(("id" = String, Path, description = "Brand ID")),
    request_body = UpdateBrandRequest,
    responses(
        (status = 200, description = "Update brand", body = ApiResponse<Brand>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Brand not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Brands"
)]
pub async fn update_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBrandRequest>,
) -> AppResult<Json<ApiResponse<Brand>>> {
    let id = parse_id(&id)?;
    let resp = brand_service::update_brand(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/brands/{id}",
    params(("id" = String, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Delete brand"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Brand not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Brands"
)]
pub async fn delete_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let id = parse_id(&id)?;
    let resp = brand_service::delete_brand(&state, &user, id).await?;
    Ok(Json(resp))
}
