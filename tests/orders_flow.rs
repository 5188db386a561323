use std::sync::Arc;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cart::AddCartItemRequest,
        inventory::AdjustInventoryRequest,
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
    },
    entity::{
        brands::ActiveModel as BrandActive,
        inventories::{ActiveModel as InventoryActive, Entity as Inventories},
        products::{ActiveModel as ProductActive, PublishStatus},
        users::ActiveModel as UserActive,
    },
    middleware::{auth::AuthUser, session::CartIdentity},
    notify::LogNotifier,
    query::ListParams,
    services::{admin_service, cart_service, order_service},
    state::AppState,
};
use uuid::Uuid;

// Full flow: anonymous cart -> claim at checkout -> pay -> admin lifecycle.
#[tokio::test]
async fn checkout_pay_and_admin_lifecycle() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user = create_user(&state, "user", "user@example.com").await?;
    let admin = create_user(&state, "admin", "admin@example.com").await?;

    let (product_id, inventory_id) = create_product_with_stock(&state, "Test Widget", 1000, 10).await?;

    // The cart starts as an anonymous session cart.
    let session_id = Uuid::new_v4().to_string();
    let identity = CartIdentity::Session(session_id.clone());
    cart_service::add_item(
        &state,
        &identity,
        AddCartItemRequest {
            inventory_id,
            quantity: 2,
        },
    )
    .await?;

    // Checkout claims the session cart for the authenticated user.
    let checkout = order_service::checkout(
        &state,
        &user,
        Some(session_id),
        CheckoutRequest {
            shipping_address: "1 Somewhere St".into(),
            billing_address: None,
        },
    )
    .await?;
    let data = checkout.data.expect("checkout data");
    assert_eq!(data.order.total_amount, 2000);
    assert_eq!(data.order.status, "pending");
    assert_eq!(data.items.len(), 1);
    assert_eq!(data.items[0].product_name, "Test Widget");
    assert_eq!(data.items[0].product_id, product_id);

    // Stock was decremented and the cart emptied.
    let inventory = Inventories::find_by_id(inventory_id)
        .one(&state.orm)
        .await?
        .expect("inventory row");
    assert_eq!(inventory.quantity, 8);
    let view = cart_service::view_cart(&state, &CartIdentity::User(user.user_id)).await?;
    assert!(view.data.expect("cart").items.is_empty());

    // A second checkout on the now-empty cart fails.
    let err = order_service::checkout(
        &state,
        &user,
        None,
        CheckoutRequest {
            shipping_address: "1 Somewhere St".into(),
            billing_address: None,
        },
    )
    .await;
    assert!(err.is_err());

    // Pay, then pay again: the second attempt is rejected.
    let order_id = data.order.id;
    let paid = order_service::pay_order(&state, &user, order_id).await?;
    let paid_order = paid.data.expect("paid order").order;
    assert_eq!(paid_order.status, "paid");
    assert!(paid_order.payment_date.is_some());
    assert!(order_service::pay_order(&state, &user, order_id).await.is_err());

    // Admin walks the lifecycle; each step stamps its date once.
    let shipped = admin_service::update_order_status(
        &state,
        &admin,
        order_id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await?;
    let shipped = shipped.data.expect("shipped order");
    assert_eq!(shipped.status, "shipped");
    assert!(shipped.shipping_date.is_some());

    assert!(
        admin_service::update_order_status(
            &state,
            &admin,
            order_id,
            UpdateOrderStatusRequest {
                status: "teleported".into(),
            },
        )
        .await
        .is_err()
    );

    // A plain user is refused the admin surface.
    assert!(
        admin_service::list_all_orders(&state, &user, ListParams::default())
            .await
            .is_err()
    );

    let detail = admin_service::get_order(&state, &admin, order_id).await?;
    let detail = detail.data.expect("order detail");
    assert_eq!(detail.customer_email, "user@example.com");
    assert_eq!(detail.items.len(), 1);

    // Inventory adjustment floors at zero.
    let adjusted = admin_service::adjust_inventory(
        &state,
        &admin,
        inventory_id,
        AdjustInventoryRequest { delta: -100 },
    )
    .await?;
    assert_eq!(adjusted.data.expect("inventory").quantity, 0);

    // And the depleted row shows up in the low-stock view.
    let low = admin_service::list_inventory(&state, &admin, ListParams::default(), true).await?;
    let rows = low.data.expect("inventory page").items;
    assert!(rows.iter().any(|r| r.inventory.id == inventory_id));

    Ok(())
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, cart_items, carts, audit_logs, password_reset_tokens, \
         product_field_values, inventories, products, template_fields, templates, categories, brands, users \
         RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState {
        pool,
        orm,
        config: AppConfig {
            database_url,
            host: "127.0.0.1".into(),
            port: 0,
            production: false,
        },
        notifier: Arc::new(LogNotifier),
    }))
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        name: Set(email.split('@').next().unwrap_or("user").to_string()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: role.into(),
    })
}

async fn create_product_with_stock(
    state: &AppState,
    name: &str,
    price: i64,
    quantity: i32,
) -> anyhow::Result<(Uuid, Uuid)> {
    let brand = BrandActive {
        id: Set(Uuid::new_v4()),
        name: Set("Test Brand".into()),
        image_url: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        status: Set(PublishStatus::Active),
        price: Set(price),
        compare_at_price: Set(None),
        images: Set(serde_json::json!([])),
        brand_id: Set(Some(brand.id)),
        primary_category_id: Set(None),
        secondary_category_id: Set(None),
        tertiary_category_id: Set(None),
        quaternary_category_id: Set(None),
        template_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let inventory = InventoryActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        quantity: Set(quantity),
        low_stock_threshold: Set(5),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok((product.id, inventory.id))
}
