use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    Statement,
};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::auth::{ConfirmResetRequest, LoginRequest, PasswordResetRequest, RegisterRequest},
    entity::password_reset_tokens::{Column as TokenCol, Entity as ResetTokens},
    notify::LogNotifier,
    services::auth_service,
    state::AppState,
};

#[tokio::test]
async fn reset_token_is_single_use() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    // login_user signs a JWT at the end of the flow.
    if std::env::var("JWT_SECRET").is_err() {
        unsafe { std::env::set_var("JWT_SECRET", "test-secret") };
    }

    auth_service::register_user(
        &state,
        RegisterRequest {
            email: "shopper@example.com".into(),
            password: "original-pw".into(),
            name: "Shopper".into(),
        },
    )
    .await?;

    // Unknown email is reported, not silently accepted.
    let err = auth_service::request_password_reset(
        &state,
        PasswordResetRequest {
            email: "nobody@example.com".into(),
        },
    )
    .await;
    assert!(err.is_err());
    assert_eq!(ResetTokens::find().count(&state.orm).await?, 0);

    auth_service::request_password_reset(
        &state,
        PasswordResetRequest {
            email: "shopper@example.com".into(),
        },
    )
    .await?;

    // The notifier only logs, so read the token back from storage.
    let row = ResetTokens::find()
        .one(&state.orm)
        .await?
        .expect("token row");
    let token = row.token.clone();

    let status = auth_service::verify_reset_token(&state, &token).await?;
    assert!(status.data.expect("status").valid);
    let status = auth_service::verify_reset_token(&state, "not-a-token").await?;
    assert!(!status.data.expect("status").valid);

    auth_service::confirm_reset(
        &state,
        ConfirmResetRequest {
            token: token.clone(),
            new_password: "fresh-pw".into(),
        },
    )
    .await?;

    // Spent tokens verify false and cannot be replayed.
    let status = auth_service::verify_reset_token(&state, &token).await?;
    assert!(!status.data.expect("status").valid);
    assert!(
        auth_service::confirm_reset(
            &state,
            ConfirmResetRequest {
                token,
                new_password: "another-pw".into(),
            },
        )
        .await
        .is_err()
    );

    // The new password works; the old one does not.
    assert!(
        auth_service::login_user(
            &state,
            LoginRequest {
                email: "shopper@example.com".into(),
                password: "original-pw".into(),
            },
        )
        .await
        .is_err()
    );
    auth_service::login_user(
        &state,
        LoginRequest {
            email: "shopper@example.com".into(),
            password: "fresh-pw".into(),
        },
    )
    .await?;

    // An expired token left behind is swept by the next request.
    let user = storefront_api::entity::users::Entity::find()
        .one(&state.orm)
        .await?
        .expect("user");
    storefront_api::entity::password_reset_tokens::ActiveModel {
        token: Set("stale-token".into()),
        user_id: Set(user.id),
        expires_at: Set((Utc::now() - Duration::hours(2)).into()),
        used_at: Set(None),
    }
    .insert(&state.orm)
    .await?;

    auth_service::request_password_reset(
        &state,
        PasswordResetRequest {
            email: "shopper@example.com".into(),
        },
    )
    .await?;
    let stale = ResetTokens::find()
        .filter(TokenCol::Token.eq("stale-token"))
        .one(&state.orm)
        .await?;
    assert!(stale.is_none(), "expired token should have been swept");

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
