use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{action, log_audit},
    dto::templates::{
        CreateTemplateRequest, TemplateDetail, TemplateFieldInput, TemplateList, TemplateWithCount,
        UpdateTemplateRequest,
    },
    entity::{
        products::{Column as ProdCol, Entity as Products, PublishStatus},
        template_fields::{
            ActiveModel as FieldActive, Column as FieldCol, Entity as TemplateFields,
        },
        templates::{ActiveModel, Column, Entity as Templates},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Template, TemplateField},
    query::{ListFilter, ListParams, SortSpec, paginate},
    response::ApiResponse,
    state::AppState,
};

const SORT: SortSpec<Column> = SortSpec::new(
    Column::UpdatedAt,
    &[
        ("name", Column::Name),
        ("status", Column::Status),
        ("created_at", Column::CreatedAt),
        ("updated_at", Column::UpdatedAt),
    ],
);

#[derive(Debug, FromQueryResult)]
struct OwnerCount {
    owner_id: Uuid,
    count: i64,
}

async fn product_counts(
    state: &AppState,
    template_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, u64>> {
    if template_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Products::find()
        .select_only()
        .column_as(ProdCol::TemplateId, "owner_id")
        .column_as(ProdCol::Id.count(), "count")
        .filter(ProdCol::TemplateId.is_in(template_ids))
        .group_by(ProdCol::TemplateId)
        .into_model::<OwnerCount>()
        .all(&state.orm)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.owner_id, row.count.max(0) as u64))
        .collect())
}

/// Insert a template's fields with dense, unique order indexes. Inputs are
/// ordered by their requested order_index, then resequenced from zero.
async fn insert_fields<C: ConnectionTrait>(
    conn: &C,
    template_id: Uuid,
    mut fields: Vec<TemplateFieldInput>,
) -> AppResult<()> {
    fields.sort_by_key(|f| f.order_index);
    for (index, field) in fields.into_iter().enumerate() {
        FieldActive {
            id: Set(Uuid::new_v4()),
            template_id: Set(template_id),
            label: Set(field.label),
            field_type: Set(field.field_type),
            order_index: Set(index as i32),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

pub async fn list_templates(
    state: &AppState,
    params: ListParams,
) -> AppResult<ApiResponse<TemplateList>> {
    let page_req = params.normalize();
    let mut filter = ListFilter::new().search(
        &page_req.search,
        vec![Expr::col((Templates, Column::Name))],
    );
    if let Some(status) = params
        .filter_status
        .as_ref()
        .and_then(|s| PublishStatus::try_from_value(s).ok())
    {
        filter = filter.and_eq(Expr::col((Templates, Column::Status)), status);
    }

    let finder = Templates::find()
        .filter(filter.into_condition())
        .order_by(SORT.resolve(page_req.sort_by.as_deref()), page_req.order.clone());

    let (rows, meta) = paginate(&state.orm, finder, &page_req).await?;

    let counts = product_counts(state, rows.iter().map(|t| t.id).collect()).await?;
    let items = rows
        .into_iter()
        .map(|model| {
            let count = counts.get(&model.id).copied().unwrap_or(0);
            TemplateWithCount {
                template: Template::from(model),
                product_count: count,
            }
        })
        .collect();

    Ok(ApiResponse::paginated("Templates", TemplateList { items }, meta))
}

pub async fn get_template(state: &AppState, id: Uuid) -> AppResult<ApiResponse<TemplateDetail>> {
    let model = Templates::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    // Field order is always order_index ascending, regardless of insertion order.
    let fields = TemplateFields::find()
        .filter(FieldCol::TemplateId.eq(id))
        .order_by_asc(FieldCol::OrderIndex)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(TemplateField::from)
        .collect();

    let counts = product_counts(state, vec![id]).await?;
    let data = TemplateDetail {
        product_count: counts.get(&id).copied().unwrap_or(0),
        template: Template::from(model),
        fields,
    };
    Ok(ApiResponse::success("Template", data))
}

pub async fn create_template(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTemplateRequest,
) -> AppResult<ApiResponse<TemplateDetail>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let id = Uuid::new_v4();
    let model = ActiveModel {
        id: Set(id),
        name: Set(payload.name),
        description: Set(payload.description),
        status: Set(payload.status.unwrap_or(PublishStatus::Active)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    insert_fields(&txn, id, payload.fields).await?;

    let fields = TemplateFields::find()
        .filter(FieldCol::TemplateId.eq(id))
        .order_by_asc(FieldCol::OrderIndex)
        .all(&txn)
        .await?
        .into_iter()
        .map(TemplateField::from)
        .collect();

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::TEMPLATE_CREATE,
        Some("templates"),
        Some(serde_json::json!({ "template_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let data = TemplateDetail {
        template: Template::from(model),
        fields,
        product_count: 0,
    };
    Ok(ApiResponse::success("Template created", data))
}

pub async fn update_template(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTemplateRequest,
) -> AppResult<ApiResponse<TemplateDetail>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let existing = Templates::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now().into());
    let model = active.update(&txn).await?;

    // Replacing the field set drops per-product values for removed fields
    // through the FK cascade.
    if let Some(fields) = payload.fields {
        TemplateFields::delete_many()
            .filter(FieldCol::TemplateId.eq(id))
            .exec(&txn)
            .await?;
        insert_fields(&txn, id, fields).await?;
    }

    let fields = TemplateFields::find()
        .filter(FieldCol::TemplateId.eq(id))
        .order_by_asc(FieldCol::OrderIndex)
        .all(&txn)
        .await?
        .into_iter()
        .map(TemplateField::from)
        .collect();

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::TEMPLATE_UPDATE,
        Some("templates"),
        Some(serde_json::json!({ "template_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let counts = product_counts(state, vec![id]).await?;
    let data = TemplateDetail {
        product_count: counts.get(&id).copied().unwrap_or(0),
        template: Template::from(model),
        fields,
    };
    Ok(ApiResponse::success("Updated", data))
}

pub async fn delete_template(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Templates::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::TEMPLATE_DELETE,
        Some("templates"),
        Some(serde_json::json!({ "template_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Deleted", serde_json::json!({})))
}
