use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::templates::{
        CreateTemplateRequest, TemplateDetail, TemplateList, UpdateTemplateRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::{ListParams, parse_id},
    services::template_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route(
            "/{id}",
            get(get_template).put(update_template).delete(delete_template),
        )
}

#[utoipa::path(
    get,
    path = "/api/templates",
    params(
        ("page" = Option<String>, Query, description = "Page number, default 1"),
        ("page_size" = Option<String>, Query, description = "Items per page, default 10, max 100"),
        ("search" = Option<String>, Query, description = "Case-insensitive name match"),
        ("filter_status" = Option<String>, Query, description = "ACTIVE, DRAFT, ARCHIVED"),
        ("sort_by" = Option<String>, Query, description = "name, created_at, updated_at"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "List templates", body = ApiResponse<TemplateList>)
    ),
    tag = "Templates"
)]
pub async fn list_templates(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<TemplateList>>> {
    let resp = template_service::list_templates(&state, params).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/templates/{id}",
    params(("id" = String, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Get template with ordered fields", body = ApiResponse<TemplateDetail>),
        (status = 400, description = "Malformed ID"),
        (status = 404, description = "Template not found"),
    ),
    tag = "Templates"
)]
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<TemplateDetail>>> {
    let id = parse_id(&id)?;
    let resp = template_service::get_template(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/templates",
    request_body = CreateTemplateRequest,
    responses(
        (status = 200, description = "Create template", body = ApiResponse<TemplateDetail>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Templates"
)]
pub async fn create_template(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTemplateRequest>,
) -> AppResult<Json<ApiResponse<TemplateDetail>>> {
    let resp = template_service::create_template(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/templates/{id}",
    params(("id" = String, Path, description = "Template ID")),
    request_body = UpdateTemplateRequest,
    responses(
        (status = 200, description = "Update template", body = ApiResponse<TemplateDetail>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Template not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Templates"
)]
pub async fn update_template(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTemplateRequest>,
) -> AppResult<Json<ApiResponse<TemplateDetail>>> {
    let id = parse_id(&id)?;
    let resp = template_service::update_template(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/templates/{id}",
    params(("id" = String, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Delete template"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Template not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Templates"
)]
pub async fn delete_template(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let id = parse_id(&id)?;
    let resp = template_service::delete_template(&state, &user, id).await?;
    Ok(Json(resp))
}
