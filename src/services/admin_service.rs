use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{action, log_audit},
    dto::inventory::{AdjustInventoryRequest, InventoryList, InventoryWithProduct},
    dto::orders::{OrderDetail, OrderList, UpdateOrderStatusRequest},
    entity::{
        inventories::{ActiveModel as InventoryActive, Column as InvCol, Entity as Inventories},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Inventory, Order, OrderItem, Product},
    query::{ListFilter, ListParams, SortSpec, paginate},
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

const ORDER_STATUSES: &[&str] = &[
    "pending",
    "paid",
    "shipped",
    "delivered",
    "refunded",
    "cancelled",
];

pub async fn list_all_orders(
    state: &AppState,
    admin: &AuthUser,
    params: ListParams,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(admin)?;

    let page_req = params.normalize();
    let filter = ListFilter::new().and_eq_opt(
        Expr::col((Orders, OrderCol::Status)),
        params.filter_status.as_ref().filter(|s| !s.is_empty()).cloned(),
    );

    let finder = Orders::find()
        .filter(filter.into_condition())
        .order_by(
            order_service::SORT.resolve(page_req.sort_by.as_deref()),
            page_req.order.clone(),
        );

    let (rows, meta) = paginate(&state.orm, finder, &page_req).await?;
    let items = rows.into_iter().map(Order::from).collect();

    Ok(ApiResponse::paginated("Orders", OrderList { items }, meta))
}

pub async fn get_order(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_admin(admin)?;

    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let customer = Users::find_by_id(order.user_id).one(&state.orm).await?;
    let (customer_name, customer_email) = match customer {
        Some(user) => (user.name, user.email),
        None => (String::new(), String::new()),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::success(
        "Order",
        OrderDetail {
            order: Order::from(order),
            items,
            customer_name,
            customer_email,
        },
    ))
}

pub async fn update_order_status(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(admin)?;

    if !ORDER_STATUSES.contains(&payload.status.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unknown order status: {}",
            payload.status
        )));
    }

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.status = Set(payload.status.clone());
    // Each lifecycle date is stamped once, when its status is first reached.
    match payload.status.as_str() {
        "paid" => {
            active.payment_status = Set("paid".into());
            active.payment_date = Set(Some(now.into()));
        }
        "shipped" => {
            active.shipping_date = Set(Some(now.into()));
        }
        "delivered" => {
            active.delivery_date = Set(Some(now.into()));
        }
        "refunded" => {
            active.payment_status = Set("refunded".into());
            active.refund_date = Set(Some(now.into()));
        }
        _ => {}
    }
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        action::ORDER_STATUS_UPDATED,
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": payload.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Order updated", Order::from(order)))
}

pub const INVENTORY_SORT: SortSpec<InvCol> = SortSpec::new(
    InvCol::UpdatedAt,
    &[
        ("updated_at", InvCol::UpdatedAt),
        ("quantity", InvCol::Quantity),
    ],
);

pub async fn list_inventory(
    state: &AppState,
    admin: &AuthUser,
    params: ListParams,
    low_stock: bool,
) -> AppResult<ApiResponse<InventoryList>> {
    ensure_admin(admin)?;

    let page_req = params.normalize();
    let mut filter = ListFilter::new();
    if !page_req.search.is_empty() {
        filter = filter.search(
            &page_req.search,
            vec![Expr::col((Products, ProdCol::Name))],
        );
    }
    let mut cond = filter.into_condition();
    if low_stock {
        cond = cond.add(
            Expr::col((Inventories, InvCol::Quantity))
                .lte(Expr::col((Inventories, InvCol::LowStockThreshold))),
        );
    }

    let finder = Inventories::find()
        .left_join(Products)
        .filter(cond)
        .order_by(
            INVENTORY_SORT.resolve(page_req.sort_by.as_deref()),
            page_req.order.clone(),
        );

    let (rows, meta) = paginate(&state.orm, finder, &page_req).await?;

    let product_ids: Vec<Uuid> = rows.iter().map(|r| r.product_id).collect();
    let mut products: HashMap<Uuid, Product> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, Product::from(p)))
        .collect();

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(product) = products.remove(&row.product_id) else {
            continue;
        };
        items.push(InventoryWithProduct {
            inventory: Inventory::from(row),
            product,
        });
    }

    Ok(ApiResponse::paginated(
        "Inventory",
        InventoryList { items },
        meta,
    ))
}

pub async fn adjust_inventory(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    payload: AdjustInventoryRequest,
) -> AppResult<ApiResponse<Inventory>> {
    ensure_admin(admin)?;

    let txn = state.orm.begin().await?;

    let row = Inventories::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    // Stock never goes negative; an oversized negative delta floors at zero.
    let next = (row.quantity + payload.delta).max(0);
    let mut active: InventoryActive = row.into();
    active.quantity = Set(next);
    active.updated_at = Set(Utc::now().into());
    let row = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        action::INVENTORY_ADJUSTED,
        Some("inventories"),
        Some(serde_json::json!({ "inventory_id": row.id, "delta": payload.delta, "quantity": next })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Inventory updated", Inventory::from(row)))
}
