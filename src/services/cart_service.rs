use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::{
    audit::{action, log_audit},
    dto::cart::{AddCartItemRequest, CartLine, CartView, UpdateCartItemRequest},
    entity::{
        cart_items::{self, ActiveModel as ItemActive, Column as ItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        inventories::{self, Column as InvCol, Entity as Inventories},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::session::CartIdentity,
    response::ApiResponse,
    state::AppState,
};

fn identity_condition(identity: &CartIdentity) -> Condition {
    match identity {
        CartIdentity::User(user_id) => Condition::all().add(CartCol::UserId.eq(*user_id)),
        CartIdentity::Session(session_id) => {
            Condition::all().add(CartCol::SessionId.eq(session_id.clone()))
        }
        CartIdentity::Both {
            user_id,
            session_id,
        } => Condition::all()
            .add(CartCol::UserId.eq(*user_id))
            .add(CartCol::SessionId.eq(session_id.clone())),
    }
}

pub async fn find_cart<C: ConnectionTrait>(
    conn: &C,
    identity: &CartIdentity,
) -> AppResult<Option<CartModel>> {
    let cart = Carts::find()
        .filter(identity_condition(identity))
        .one(conn)
        .await?;
    Ok(cart)
}

pub async fn find_or_create_cart<C: ConnectionTrait>(
    conn: &C,
    identity: &CartIdentity,
) -> AppResult<CartModel> {
    if let Some(cart) = find_cart(conn, identity).await? {
        return Ok(cart);
    }
    let (user_id, session_id) = match identity {
        CartIdentity::User(user_id) => (Some(*user_id), None),
        CartIdentity::Session(session_id) => (None, Some(session_id.clone())),
        CartIdentity::Both {
            user_id,
            session_id,
        } => (Some(*user_id), Some(session_id.clone())),
    };
    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        session_id: Set(session_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(cart)
}

/// Attach an anonymous session cart to a user at login/checkout. If the user
/// already owns a cart, the session cart's lines are merged into it and the
/// session cart removed.
pub async fn claim_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    session_id: &str,
) -> AppResult<()> {
    let session_cart = Carts::find()
        .filter(
            Condition::all()
                .add(CartCol::SessionId.eq(session_id))
                .add(CartCol::UserId.is_null()),
        )
        .one(conn)
        .await?;
    let Some(session_cart) = session_cart else {
        return Ok(());
    };

    let user_cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?;

    match user_cart {
        None => {
            let mut active: CartActive = session_cart.into();
            active.user_id = Set(Some(user_id));
            active.updated_at = Set(Utc::now().into());
            active.update(conn).await?;
        }
        Some(user_cart) => {
            let lines = CartItems::find()
                .filter(ItemCol::CartId.eq(session_cart.id))
                .all(conn)
                .await?;
            for line in lines {
                let existing = CartItems::find()
                    .filter(
                        Condition::all()
                            .add(ItemCol::CartId.eq(user_cart.id))
                            .add(ItemCol::InventoryId.eq(line.inventory_id)),
                    )
                    .one(conn)
                    .await?;
                match existing {
                    Some(existing) => {
                        let quantity = existing.quantity + line.quantity;
                        let mut active: ItemActive = existing.into();
                        active.quantity = Set(quantity);
                        active.update(conn).await?;
                    }
                    None => {
                        ItemActive {
                            id: Set(Uuid::new_v4()),
                            cart_id: Set(user_cart.id),
                            inventory_id: Set(line.inventory_id),
                            quantity: Set(line.quantity),
                            created_at: NotSet,
                        }
                        .insert(conn)
                        .await?;
                    }
                }
            }
            Carts::delete_by_id(session_cart.id).exec(conn).await?;
        }
    }
    Ok(())
}

#[derive(Debug, FromQueryResult)]
pub struct CartLineRow {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub quantity: i32,
    pub product_id: Uuid,
    pub product_name: String,
    pub price: i64,
    pub available: i32,
}

/// Cart lines joined with inventory and product, newest first.
pub async fn load_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
) -> AppResult<Vec<CartLineRow>> {
    let product_id: SimpleExpr = Expr::col((Products, ProdCol::Id)).into();
    let product_name: SimpleExpr = Expr::col((Products, ProdCol::Name)).into();
    let price: SimpleExpr = Expr::col((Products, ProdCol::Price)).into();
    let available: SimpleExpr = Expr::col((Inventories, InvCol::Quantity)).into();

    let rows = CartItems::find()
        .select_only()
        .column_as(ItemCol::Id, "id")
        .column_as(ItemCol::InventoryId, "inventory_id")
        .column_as(ItemCol::Quantity, "quantity")
        .column_as(product_id, "product_id")
        .column_as(product_name, "product_name")
        .column_as(price, "price")
        .column_as(available, "available")
        .join(JoinType::InnerJoin, cart_items::Relation::Inventories.def())
        .join(JoinType::InnerJoin, inventories::Relation::Products.def())
        .filter(ItemCol::CartId.eq(cart_id))
        .order_by_desc(ItemCol::CreatedAt)
        .into_model::<CartLineRow>()
        .all(conn)
        .await?;
    Ok(rows)
}

pub async fn view_cart(
    state: &AppState,
    identity: &CartIdentity,
) -> AppResult<ApiResponse<CartView>> {
    let cart = find_or_create_cart(&state.orm, identity).await?;
    let rows = load_lines(&state.orm, cart.id).await?;

    let subtotal = rows
        .iter()
        .map(|row| row.price * i64::from(row.quantity))
        .sum();
    let items = rows
        .into_iter()
        .map(|row| CartLine {
            id: row.id,
            inventory_id: row.inventory_id,
            product_id: row.product_id,
            product_name: row.product_name,
            price: row.price,
            quantity: row.quantity,
            available: row.available,
        })
        .collect();

    let data = CartView {
        cart_id: cart.id,
        items,
        subtotal,
    };
    Ok(ApiResponse::success("Cart", data))
}

pub async fn add_item(
    state: &AppState,
    identity: &CartIdentity,
    payload: AddCartItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".into(),
        ));
    }

    let inventory = Inventories::find_by_id(payload.inventory_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("inventory item not found".into()))?;

    let cart = find_or_create_cart(&state.orm, identity).await?;

    let existing = CartItems::find()
        .filter(
            Condition::all()
                .add(ItemCol::CartId.eq(cart.id))
                .add(ItemCol::InventoryId.eq(inventory.id)),
        )
        .one(&state.orm)
        .await?;

    match existing {
        Some(item) => {
            let mut active: ItemActive = item.into();
            active.quantity = Set(payload.quantity);
            active.update(&state.orm).await?;
        }
        None => {
            ItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                inventory_id: Set(inventory.id),
                quantity: Set(payload.quantity),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?;
        }
    }

    touch_cart(state, cart.id).await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        action::CART_UPDATE,
        Some("cart_items"),
        Some(serde_json::json!({
            "cart_id": cart.id,
            "inventory_id": payload.inventory_id,
            "quantity": payload.quantity,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    view_cart(state, identity).await
}

pub async fn update_item(
    state: &AppState,
    identity: &CartIdentity,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".into(),
        ));
    }

    let cart = find_cart(&state.orm, identity)
        .await?
        .ok_or(AppError::NotFound)?;
    let item = CartItems::find()
        .filter(
            Condition::all()
                .add(ItemCol::Id.eq(item_id))
                .add(ItemCol::CartId.eq(cart.id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ItemActive = item.into();
    active.quantity = Set(payload.quantity);
    active.update(&state.orm).await?;

    touch_cart(state, cart.id).await?;
    view_cart(state, identity).await
}

pub async fn remove_item(
    state: &AppState,
    identity: &CartIdentity,
    item_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let cart = find_cart(&state.orm, identity)
        .await?
        .ok_or(AppError::NotFound)?;
    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(ItemCol::Id.eq(item_id))
                .add(ItemCol::CartId.eq(cart.id)),
        )
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    touch_cart(state, cart.id).await?;
    view_cart(state, identity).await
}

async fn touch_cart(state: &AppState, cart_id: Uuid) -> AppResult<()> {
    Carts::update_many()
        .col_expr(CartCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(CartCol::Id.eq(cart_id))
        .exec(&state.orm)
        .await?;
    Ok(())
}
