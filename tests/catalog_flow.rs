use std::sync::Arc;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        brands::ActiveModel as BrandActive, products::ActiveModel as ProductActive,
        products::PublishStatus,
    },
    notify::LogNotifier,
    query::ListParams,
    routes::params::ProductListParams,
    services::product_service,
    state::AppState,
};
use uuid::Uuid;

// Listing behavior: pagination math, lenient parameters, allow-listed sort,
// case-insensitive search across joined names.
#[tokio::test]
async fn product_listing_paginates_and_searches() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let brand = BrandActive {
        id: Set(Uuid::new_v4()),
        name: Set("Vaillant".into()),
        image_url: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    for n in 1..=25 {
        let name = if n == 13 {
            "Widget 13 Combi Boiler".to_string()
        } else {
            format!("Widget {n:02}")
        };
        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(None),
            status: Set(PublishStatus::Active),
            price: Set(1000 * n),
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
    }

    // Page 2 of 25 under name asc: items 11..20.
    let resp = product_service::list_products(
        &state,
        ProductListParams {
            list: ListParams {
                page: Some("2".into()),
                page_size: Some("10".into()),
                sort_by: Some("name".into()),
                sort_order: Some("asc".into()),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .await?;
    let meta = resp.pagination.expect("pagination block");
    assert_eq!(meta.current_page, 2);
    assert_eq!(meta.page_size, 10);
    assert_eq!(meta.total_count, 25);
    assert_eq!(meta.total_pages, 3);
    assert!(meta.has_more);
    let items = resp.data.expect("page data").items;
    assert_eq!(items.len(), 10);
    assert_eq!(items[0].name, "Widget 11");

    // Search is case-insensitive and matches inside the name.
    let resp = product_service::list_products(
        &state,
        ProductListParams {
            list: ListParams {
                search: Some("boiL".into()),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .await?;
    let items = resp.data.expect("search data").items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Widget 13 Combi Boiler");

    // Garbage paging input falls back to defaults instead of failing.
    let resp = product_service::list_products(
        &state,
        ProductListParams {
            list: ListParams {
                page: Some("banana".into()),
                page_size: Some("-3".into()),
                sort_by: Some("password_hash".into()),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .await?;
    let meta = resp.pagination.expect("pagination block");
    assert_eq!(meta.current_page, 1);
    assert_eq!(meta.page_size, 10);
    assert_eq!(meta.total_count, 25);

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
