use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_rideshare_api::{config::AppConfig, db::create_pool};
use chrono::{Duration, Utc};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let driver_id = ensure_user(&pool, "Dewi", "driver@example.com", "driver123", true).await?;
    let passenger_id =
        ensure_user(&pool, "Pasha", "passenger@example.com", "passenger123", false).await?;
    seed_vehicle(&pool, driver_id).await?;
    seed_rides(&pool, driver_id).await?;

    println!("Seed completed. Driver ID: {driver_id}, Passenger ID: {passenger_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    is_driver: bool,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, is_driver)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET is_driver = EXCLUDED.is_driver
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(is_driver)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (is_driver={is_driver})");
    Ok(row.0)
}

async fn seed_vehicle(pool: &sqlx::PgPool, driver_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO vehicles (id, driver_id, make, model, year, color, license_plate)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (license_plate) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(driver_id)
    .bind("Toyota")
    .bind("Avanza")
    .bind(2021)
    .bind("Silver")
    .bind("B 1234 XYZ")
    .execute(pool)
    .await?;

    println!("Seeded vehicle");
    Ok(())
}

async fn seed_rides(pool: &sqlx::PgPool, driver_id: Uuid) -> anyhow::Result<()> {
    let rides = vec![
        ("Jakarta", "Bandung", 3, 150000.0_f64),
        ("Bandung", "Yogyakarta", 7, 275000.0),
        ("Jakarta", "Surabaya", 14, 450000.0),
    ];

    for (i, (origin, destination, days, price)) in rides.into_iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO rides (id, driver_id, origin, destination, date, price, seats_available, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'SCHEDULED')
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(driver_id)
        .bind(origin)
        .bind(destination)
        .bind(Utc::now() + Duration::days(days))
        .bind(price)
        .bind(3 + i as i32)
        .execute(pool)
        .await?;
    }

    println!("Seeded rides");
    Ok(())
}
