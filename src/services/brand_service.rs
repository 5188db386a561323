use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::{action, log_audit},
    dto::brands::{BrandList, BrandWithCount, CreateBrandRequest, UpdateBrandRequest},
    entity::{
        brands::{ActiveModel, Column, Entity as Brands},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Brand,
    query::{ListFilter, ListParams, SortSpec, paginate},
    response::ApiResponse,
    state::AppState,
};

const SORT: SortSpec<Column> = SortSpec::new(
    Column::UpdatedAt,
    &[
        ("name", Column::Name),
        ("created_at", Column::CreatedAt),
        ("updated_at", Column::UpdatedAt),
    ],
);

#[derive(Debug, FromQueryResult)]
struct OwnerCount {
    owner_id: Uuid,
    count: i64,
}

/// One grouped query for the per-brand product counts of a page of brands.
async fn product_counts(state: &AppState, brand_ids: Vec<Uuid>) -> AppResult<HashMap<Uuid, u64>> {
    if brand_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Products::find()
        .select_only()
        .column_as(ProdCol::BrandId, "owner_id")
        .column_as(ProdCol::Id.count(), "count")
        .filter(ProdCol::BrandId.is_in(brand_ids))
        .group_by(ProdCol::BrandId)
        .into_model::<OwnerCount>()
        .all(&state.orm)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.owner_id, row.count.max(0) as u64))
        .collect())
}

pub async fn list_brands(
    state: &AppState,
    params: ListParams,
) -> AppResult<ApiResponse<BrandList>> {
    let page_req = params.normalize();
    let cond = ListFilter::new()
        .search(&page_req.search, vec![Expr::col((Brands, Column::Name))])
        .into_condition();

    let finder = Brands::find()
        .filter(cond)
        .order_by(SORT.resolve(page_req.sort_by.as_deref()), page_req.order.clone());

    let (rows, meta) = paginate(&state.orm, finder, &page_req).await?;

    let counts = product_counts(state, rows.iter().map(|b| b.id).collect()).await?;
    let items = rows
        .into_iter()
        .map(|model| {
            let count = counts.get(&model.id).copied().unwrap_or(0);
            BrandWithCount {
                brand: Brand::from(model),
                product_count: count,
            }
        })
        .collect();

    Ok(ApiResponse::paginated("Brands", BrandList { items }, meta))
}

pub async fn get_brand(state: &AppState, id: Uuid) -> AppResult<ApiResponse<BrandWithCount>> {
    let model = Brands::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let counts = product_counts(state, vec![model.id]).await?;
    let data = BrandWithCount {
        product_count: counts.get(&model.id).copied().unwrap_or(0),
        brand: Brand::from(model),
    };
    Ok(ApiResponse::success("Brand", data))
}

pub async fn create_brand(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBrandRequest,
) -> AppResult<ApiResponse<Brand>> {
    ensure_admin(user)?;
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        image_url: Set(payload.image_url),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let model = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::BRAND_CREATE,
        Some("brands"),
        Some(serde_json::json!({ "brand_id": model.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Brand created", Brand::from(model)))
}

pub async fn update_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBrandRequest,
) -> AppResult<ApiResponse<Brand>> {
    ensure_admin(user)?;
    let existing = Brands::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    active.updated_at = Set(Utc::now().into());
    let model = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::BRAND_UPDATE,
        Some("brands"),
        Some(serde_json::json!({ "brand_id": model.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", Brand::from(model)))
}

pub async fn delete_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Brands::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::BRAND_DELETE,
        Some("brands"),
        Some(serde_json::json!({ "brand_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Deleted", serde_json::json!({})))
}
