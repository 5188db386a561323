use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{action, log_audit},
    dto::products::{
        CreateProductRequest, FieldValueInput, ProductDetail, ProductList, ResolvedField,
        UpdateProductRequest,
    },
    entity::{
        brands::{Column as BrandCol, Entity as Brands},
        categories::{Column as CatCol, Entity as Categories},
        inventories::{ActiveModel as InventoryActive, Column as InvCol, Entity as Inventories},
        product_field_values::{
            ActiveModel as ValueActive, Column as ValueCol, Entity as ProductFieldValues,
        },
        products::{self, ActiveModel, Column, Entity as Products, PublishStatus},
        template_fields::{Column as FieldCol, Entity as TemplateFields},
        templates::Entity as Templates,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Brand, Category, Inventory, Product, Template, TemplateField},
    query::{ListFilter, SortSpec, paginate},
    response::ApiResponse,
    routes::params::ProductListParams,
    state::AppState,
};

const SORT: SortSpec<Column> = SortSpec::new(
    Column::UpdatedAt,
    &[
        ("name", Column::Name),
        ("price", Column::Price),
        ("status", Column::Status),
        ("created_at", Column::CreatedAt),
        ("updated_at", Column::UpdatedAt),
    ],
);

pub async fn list_products(
    state: &AppState,
    query: ProductListParams,
) -> AppResult<ApiResponse<ProductList>> {
    let page_req = query.list.normalize();

    // Search spans the product name and the names of its brand and primary
    // category, so both relations are joined for the WHERE clause only.
    let mut filter = ListFilter::new().search(
        &page_req.search,
        vec![
            Expr::col((Products, Column::Name)),
            Expr::col((Brands, BrandCol::Name)),
            Expr::col((Categories, CatCol::Name)),
        ],
    );
    if let Some(status) = query
        .list
        .filter_status
        .as_ref()
        .and_then(|s| PublishStatus::try_from_value(s).ok())
    {
        filter = filter.and_eq(Expr::col((Products, Column::Status)), status);
    }
    filter = filter
        .and_eq_opt(
            Expr::col((Products, Column::PrimaryCategoryId)),
            query.primary_category_id,
        )
        .and_eq_opt(
            Expr::col((Products, Column::SecondaryCategoryId)),
            query.secondary_category_id,
        )
        .and_eq_opt(
            Expr::col((Products, Column::TertiaryCategoryId)),
            query.tertiary_category_id,
        )
        .and_eq_opt(
            Expr::col((Products, Column::QuaternaryCategoryId)),
            query.quaternary_category_id,
        );

    let finder = Products::find()
        .join(JoinType::LeftJoin, products::Relation::Brands.def())
        .join(JoinType::LeftJoin, products::Relation::PrimaryCategory.def())
        .filter(filter.into_condition())
        .order_by(SORT.resolve(page_req.sort_by.as_deref()), page_req.order.clone());

    let (rows, meta) = paginate(&state.orm, finder, &page_req).await?;
    let items = rows.into_iter().map(Product::from).collect();

    Ok(ApiResponse::paginated("Products", ProductList { items }, meta))
}

pub async fn get_product_detail(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<ProductDetail>> {
    let model = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let brand = match model.brand_id {
        Some(brand_id) => Brands::find_by_id(brand_id).one(&state.orm).await?,
        None => None,
    };

    // The four tiers are independent foreign keys; one batched fetch covers
    // whichever of them are set.
    let category_ids: Vec<Uuid> = [
        model.primary_category_id,
        model.secondary_category_id,
        model.tertiary_category_id,
        model.quaternary_category_id,
    ]
    .into_iter()
    .flatten()
    .collect();
    let mut categories: HashMap<Uuid, Category> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        Categories::find()
            .filter(CatCol::Id.is_in(category_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|c| (c.id, Category::from(c)))
            .collect()
    };

    let template = match model.template_id {
        Some(template_id) => Templates::find_by_id(template_id).one(&state.orm).await?,
        None => None,
    };

    let fields = resolve_fields(&state.orm, &model).await?;

    let inventory = Inventories::find()
        .filter(InvCol::ProductId.eq(id))
        .one(&state.orm)
        .await?;

    let primary = model.primary_category_id.and_then(|cid| categories.remove(&cid));
    let secondary = model.secondary_category_id.and_then(|cid| categories.remove(&cid));
    let tertiary = model.tertiary_category_id.and_then(|cid| categories.remove(&cid));
    let quaternary = model.quaternary_category_id.and_then(|cid| categories.remove(&cid));

    let data = ProductDetail {
        product: Product::from(model),
        brand: brand.map(Brand::from),
        primary_category: primary,
        secondary_category: secondary,
        tertiary_category: tertiary,
        quaternary_category: quaternary,
        template: template.map(Template::from),
        fields,
        inventory: inventory.map(Inventory::from),
    };
    Ok(ApiResponse::success("Product", data))
}

/// Template fields in order_index order, each paired with this product's
/// stored value when one exists.
async fn resolve_fields<C: ConnectionTrait>(
    conn: &C,
    model: &products::Model,
) -> AppResult<Vec<ResolvedField>> {
    let Some(template_id) = model.template_id else {
        return Ok(Vec::new());
    };

    let fields = TemplateFields::find()
        .filter(FieldCol::TemplateId.eq(template_id))
        .order_by_asc(FieldCol::OrderIndex)
        .all(conn)
        .await?;

    let mut values: HashMap<Uuid, String> = ProductFieldValues::find()
        .filter(ValueCol::ProductId.eq(model.id))
        .all(conn)
        .await?
        .into_iter()
        .map(|v| (v.template_field_id, v.value))
        .collect();

    Ok(fields
        .into_iter()
        .map(|field| ResolvedField {
            value: values.remove(&field.id),
            field: TemplateField::from(field),
        })
        .collect())
}

/// Replace a product's stored field values. Only values whose field belongs
/// to the product's template are kept.
async fn write_field_values<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    template_id: Option<Uuid>,
    values: Vec<FieldValueInput>,
) -> AppResult<()> {
    ProductFieldValues::delete_many()
        .filter(ValueCol::ProductId.eq(product_id))
        .exec(conn)
        .await?;

    let Some(template_id) = template_id else {
        return Ok(());
    };
    let known: Vec<Uuid> = TemplateFields::find()
        .filter(FieldCol::TemplateId.eq(template_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|f| f.id)
        .collect();

    for input in values {
        if !known.contains(&input.template_field_id) {
            return Err(AppError::BadRequest(format!(
                "field {} does not belong to the product template",
                input.template_field_id
            )));
        }
        ValueActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            template_field_id: Set(input.template_field_id),
            value: Set(input.value),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let id = Uuid::new_v4();
    let model = ActiveModel {
        id: Set(id),
        name: Set(payload.name),
        description: Set(payload.description),
        status: Set(payload.status.unwrap_or(PublishStatus::Draft)),
        price: Set(payload.price),
        compare_at_price: Set(payload.compare_at_price),
        images: Set(serde_json::json!(payload.images)),
        brand_id: Set(payload.brand_id),
        primary_category_id: Set(payload.primary_category_id),
        secondary_category_id: Set(payload.secondary_category_id),
        tertiary_category_id: Set(payload.tertiary_category_id),
        quaternary_category_id: Set(payload.quaternary_category_id),
        template_id: Set(payload.template_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    write_field_values(&txn, id, model.template_id, payload.field_values).await?;

    InventoryActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(id),
        quantity: Set(payload.initial_quantity.unwrap_or(0).max(0)),
        low_stock_threshold: NotSet,
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::PRODUCT_CREATE,
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Product created", Product::from(model)))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let existing = Products::find_by_id(id)
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
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(compare_at_price) = payload.compare_at_price {
        active.compare_at_price = Set(Some(compare_at_price));
    }
    if let Some(images) = payload.images {
        active.images = Set(serde_json::json!(images));
    }
    if let Some(brand_id) = payload.brand_id {
        active.brand_id = Set(Some(brand_id));
    }
    if let Some(cid) = payload.primary_category_id {
        active.primary_category_id = Set(Some(cid));
    }
    if let Some(cid) = payload.secondary_category_id {
        active.secondary_category_id = Set(Some(cid));
    }
    if let Some(cid) = payload.tertiary_category_id {
        active.tertiary_category_id = Set(Some(cid));
    }
    if let Some(cid) = payload.quaternary_category_id {
        active.quaternary_category_id = Set(Some(cid));
    }
    if let Some(template_id) = payload.template_id {
        active.template_id = Set(Some(template_id));
    }
    active.updated_at = Set(Utc::now().into());
    let model = active.update(&txn).await?;

    if let Some(values) = payload.field_values {
        write_field_values(&txn, id, model.template_id, values).await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::PRODUCT_UPDATE,
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", Product::from(model)))
}

/// Products are archived, never hard-deleted.
pub async fn archive_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    active.status = Set(PublishStatus::Archived);
    active.updated_at = Set(Utc::now().into());
    let model = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::PRODUCT_ARCHIVE,
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Archived", Product::from(model)))
}
