use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, ExprTrait, LockType, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{action, log_audit},
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        cart_items::{self, Column as ItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        inventories::{self, Column as InvCol, Entity as Inventories},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    query::{ListFilter, ListParams, SortSpec, paginate},
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub const SORT: SortSpec<OrderCol> = SortSpec::new(
    OrderCol::CreatedAt,
    &[
        ("created_at", OrderCol::CreatedAt),
        ("updated_at", OrderCol::UpdatedAt),
        ("total_amount", OrderCol::TotalAmount),
        ("status", OrderCol::Status),
    ],
);

#[derive(Debug, FromQueryResult)]
struct CheckoutRow {
    item_id: Uuid,
    inventory_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    product_name: String,
    price: i64,
    available: i32,
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    session_id: Option<String>,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    // An anonymous cart built before login belongs to this user now.
    if let Some(sid) = session_id.as_deref() {
        cart_service::claim_for_user(&txn, user.user_id, sid).await?;
    }

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;

    let product_id: SimpleExpr = Expr::col((Products, ProdCol::Id)).into();
    let product_name: SimpleExpr = Expr::col((Products, ProdCol::Name)).into();
    let price: SimpleExpr = Expr::col((Products, ProdCol::Price)).into();
    let available: SimpleExpr = Expr::col((Inventories, InvCol::Quantity)).into();

    // Lock the cart lines and their inventory rows for the whole checkout.
    let rows = CartItems::find()
        .select_only()
        .column_as(ItemCol::Id, "item_id")
        .column_as(ItemCol::InventoryId, "inventory_id")
        .column_as(ItemCol::Quantity, "quantity")
        .column_as(product_id, "product_id")
        .column_as(product_name, "product_name")
        .column_as(price, "price")
        .column_as(available, "available")
        .join(JoinType::InnerJoin, cart_items::Relation::Inventories.def())
        .join(JoinType::InnerJoin, inventories::Relation::Products.def())
        .filter(ItemCol::CartId.eq(cart.id))
        .lock(LockType::Update)
        .into_model::<CheckoutRow>()
        .all(&txn)
        .await?;

    if rows.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let mut total_amount: i64 = 0;
    for row in &rows {
        if row.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }
        if row.available < row.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                row.product_name
            )));
        }
        total_amount += row.price * i64::from(row.quantity);
    }

    let order_id = Uuid::new_v4();
    let billing = payload
        .billing_address
        .unwrap_or_else(|| payload.shipping_address.clone());
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        status: Set("pending".into()),
        payment_status: Set("unpaid".into()),
        total_amount: Set(total_amount),
        shipping_address: Set(payload.shipping_address),
        billing_address: Set(billing),
        payment_date: Set(None),
        shipping_date: Set(None),
        delivery_date: Set(None),
        refund_date: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::new();
    for row in &rows {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(row.product_id),
            product_name: Set(row.product_name.clone()),
            price: Set(row.price),
            quantity: Set(row.quantity),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(OrderItem::from(item));

        Inventories::update_many()
            .col_expr(
                InvCol::Quantity,
                Expr::col(InvCol::Quantity).sub(row.quantity),
            )
            .filter(InvCol::Id.eq(row.inventory_id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(ItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::CHECKOUT,
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: Order::from(order),
            items: order_items,
        },
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    params: ListParams,
) -> AppResult<ApiResponse<OrderList>> {
    let page_req = params.normalize();
    let filter = ListFilter::new()
        .and_eq(Expr::col((Orders, OrderCol::UserId)), user.user_id)
        .and_eq_opt(
            Expr::col((Orders, OrderCol::Status)),
            params.filter_status.as_ref().filter(|s| !s.is_empty()).cloned(),
        );

    let finder = Orders::find()
        .filter(filter.into_condition())
        .order_by(SORT.resolve(page_req.sort_by.as_deref()), page_req.order.clone());

    let (rows, meta) = paginate(&state.orm, finder, &page_req).await?;
    let items = rows.into_iter().map(Order::from).collect();

    Ok(ApiResponse::paginated("Orders", OrderList { items }, meta))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::success(
        "Order",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
    ))
}

pub async fn pay_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.payment_status == "paid" {
        return Err(AppError::BadRequest("Order already paid".into()));
    }

    let mut active: OrderActive = order.into();
    active.payment_status = Set("paid".into());
    active.status = Set("paid".into());
    active.payment_date = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action::ORDER_PAID,
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment recorded",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
    ))
}
