use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use storefront_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user123", "user").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, name, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind("Seed Account")
    .bind(role)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let existing: (i64,) = sqlx::query_as("SELECT count(*) FROM products")
        .fetch_one(pool)
        .await?;
    if existing.0 > 0 {
        return Ok(());
    }

    let brand_id = Uuid::new_v4();
    sqlx::query("INSERT INTO brands (id, name) VALUES ($1, $2)")
        .bind(brand_id)
        .bind("Vaillant")
        .execute(pool)
        .await?;

    // One full tier chain so category filters have something to bite on.
    let tiers = ["primary", "secondary", "tertiary", "quaternary"];
    let names = ["Heating", "Boilers", "Combi Boilers", "Compact"];
    let mut parent: Option<Uuid> = None;
    let mut category_ids = Vec::new();
    for (tier, name) in tiers.iter().zip(names) {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO categories (id, name, tier, parent_id) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(name)
            .bind(tier)
            .bind(parent)
            .execute(pool)
            .await?;
        category_ids.push(id);
        parent = Some(id);
    }

    let template_id = Uuid::new_v4();
    sqlx::query("INSERT INTO templates (id, name, description, status) VALUES ($1, $2, $3, 'ACTIVE')")
        .bind(template_id)
        .bind("Boiler")
        .bind("Combi boiler spec sheet")
        .execute(pool)
        .await?;
    for (index, label) in ["Output (kW)", "Flow rate (l/min)", "Warranty (years)"]
        .iter()
        .enumerate()
    {
        sqlx::query(
            "INSERT INTO template_fields (id, template_id, label, field_type, order_index) VALUES ($1, $2, $3, 'text', $4)",
        )
        .bind(Uuid::new_v4())
        .bind(template_id)
        .bind(label)
        .bind(index as i32)
        .execute(pool)
        .await?;
    }

    let product_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO products (id, name, description, status, price, images, brand_id,
            primary_category_id, secondary_category_id, tertiary_category_id, quaternary_category_id, template_id)
        VALUES ($1, $2, $3, 'ACTIVE', $4, '[]', $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(product_id)
    .bind("ecoTEC plus 832")
    .bind("32kW combi boiler")
    .bind(189900_i64)
    .bind(brand_id)
    .bind(category_ids[0])
    .bind(category_ids[1])
    .bind(category_ids[2])
    .bind(category_ids[3])
    .bind(template_id)
    .execute(pool)
    .await?;

    sqlx::query("INSERT INTO inventories (id, product_id, quantity) VALUES ($1, $2, 25)")
        .bind(Uuid::new_v4())
        .bind(product_id)
        .execute(pool)
        .await?;

    Ok(())
}
