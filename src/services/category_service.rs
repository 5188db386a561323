use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveEnum, ActiveModelTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit::{action, log_audit},
    dto::categories::{CategoryDetail, CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
    entity::{
        Categories,
        categories::{ActiveModel, CategoryTier, Column, Model as CategoryModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Category,
    query::{ListFilter, SortSpec, paginate},
    response::ApiResponse,
    routes::params::CategoryListParams,
    state::AppState,
};

const SORT: SortSpec<Column> = SortSpec::new(
    Column::Name,
    &[
        ("name", Column::Name),
        ("tier", Column::Tier),
        ("created_at", Column::CreatedAt),
        ("updated_at", Column::UpdatedAt),
    ],
);

pub async fn list_categories(
    state: &AppState,
    query: CategoryListParams,
) -> AppResult<ApiResponse<CategoryList>> {
    let page_req = query.list.normalize();

    let mut filter = ListFilter::new()
        .search(&page_req.search, vec![Expr::col((Categories, Column::Name))])
        .and_eq_opt(Expr::col((Categories, Column::ParentId)), query.parent_id);
    if let Some(tier) = query
        .tier
        .as_ref()
        .and_then(|s| CategoryTier::try_from_value(s).ok())
    {
        filter = filter.and_eq(Expr::col((Categories, Column::Tier)), tier);
    }

    let finder = Categories::find()
        .filter(filter.into_condition())
        .order_by(SORT.resolve(page_req.sort_by.as_deref()), page_req.order.clone());

    let (rows, meta) = paginate(&state.orm, finder, &page_req).await?;
    let items = rows.into_iter().map(Category::from).collect();

    Ok(ApiResponse::paginated("Categories", CategoryList { items }, meta))
}

/// Tier invariant, enforced at write time: a primary category has no parent,
/// every lower tier requires a parent of exactly the tier above.
async fn check_parent(
    state: &AppState,
    tier: CategoryTier,
    parent_id: Option<Uuid>,
) -> AppResult<()> {
    match (tier.parent_tier(), parent_id) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(AppError::BadRequest(
            "a primary category cannot have a parent".into(),
        )),
        (Some(_), None) => Err(AppError::BadRequest(format!(
            "a {tier:?} category requires a parent"
        ))),
        (Some(expected), Some(pid)) => {
            let parent = Categories::find_by_id(pid)
                .one(&state.orm)
                .await?
                .ok_or_else(|| AppError::BadRequest("parent category not found".into()))?;
            if parent.tier != expected {
                return Err(AppError::BadRequest(format!(
                    "parent of a {tier:?} category must be {expected:?}"
                )));
            }
            Ok(())
        }
    }
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<CategoryDetail>> {
    let model = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    // Only the immediate parent is resolved; full breadcrumbs are the
    // caller's three-step link-following problem.
    let parent = match model.parent_id {
        Some(pid) => Categories::find_by_id(pid).one(&state.orm).await?,
        None => None,
    };

    let data = CategoryDetail {
        category: Category::from(model),
        parent: parent.map(Category::from),
    };
    Ok(ApiResponse::success("Category", data))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    check_parent(state, payload.tier, payload.parent_id).await?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        tier: Set(payload.tier),
        parent_id: Set(payload.parent_id),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let model = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::CATEGORY_CREATE,
        Some("categories"),
        Some(serde_json::json!({ "category_id": model.id, "tier": model.tier })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Category created", Category::from(model)))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let existing: CategoryModel = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(parent_id) = payload.parent_id {
        check_parent(state, existing.tier, Some(parent_id)).await?;
    }

    let tier = existing.tier;
    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(parent_id) = payload.parent_id {
        active.parent_id = Set(Some(parent_id));
    }
    active.updated_at = Set(Utc::now().into());
    let model = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::CATEGORY_UPDATE,
        Some("categories"),
        Some(serde_json::json!({ "category_id": model.id, "tier": tier })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", Category::from(model)))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Categories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::CATEGORY_DELETE,
        Some("categories"),
        Some(serde_json::json!({ "category_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Deleted", serde_json::json!({})))
}
