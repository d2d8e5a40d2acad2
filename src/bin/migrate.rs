use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

/// Applies the embedded schema migrations to `DATABASE_URL`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL must be set in environment")?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await?;

    log::info!("Running directory schema migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Migrations applied");

    pool.close().await;
    Ok(())
}
