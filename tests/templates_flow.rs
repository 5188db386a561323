use std::sync::Arc;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::templates::{CreateTemplateRequest, TemplateFieldInput},
    entity::users::ActiveModel as UserActive,
    middleware::auth::AuthUser,
    notify::LogNotifier,
    services::template_service,
    state::AppState,
};
use uuid::Uuid;

#[tokio::test]
async fn template_fields_keep_requested_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin = create_admin(&state).await?;

    // Sparse, out-of-order indexes come back dense and sorted.
    let resp = template_service::create_template(
        &state,
        &admin,
        CreateTemplateRequest {
            name: "Boiler".into(),
            description: None,
            status: None,
            fields: vec![
                TemplateFieldInput {
                    label: "Warranty".into(),
                    field_type: "text".into(),
                    order_index: 9,
                },
                TemplateFieldInput {
                    label: "Output".into(),
                    field_type: "text".into(),
                    order_index: 2,
                },
                TemplateFieldInput {
                    label: "Flow rate".into(),
                    field_type: "text".into(),
                    order_index: 5,
                },
            ],
        },
    )
    .await?;
    let template_id = resp.data.expect("template").template.id;

    let detail = template_service::get_template(&state, template_id).await?;
    let fields = detail.data.expect("detail").fields;
    let labels: Vec<&str> = fields.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, ["Output", "Flow rate", "Warranty"]);
    let indexes: Vec<i32> = fields.iter().map(|f| f.order_index).collect();
    assert_eq!(indexes, [0, 1, 2]);

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

async fn create_admin(state: &AppState) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set("admin@example.com".into()),
        password_hash: Set("dummy".into()),
        name: Set("Admin".into()),
        role: Set("admin".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role: "admin".into(),
    })
}
