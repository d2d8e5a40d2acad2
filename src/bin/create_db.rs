use tokio_postgres::NoTls;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let conn_str = std::env::var("PG_ADMIN_CONN")
        .unwrap_or_else(|_| "host=127.0.0.1 user=postgres dbname=postgres".into());
    let db_name = std::env::var("DB_NAME").unwrap_or_else(|_| "acrepair_directory".into());

    if !db_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid database name '{db_name}'").into());
    }

    log::info!("Connecting to Postgres to provision '{db_name}'");
    let (client, connection) = tokio_postgres::connect(&conn_str, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("connection error: {e}");
        }
    });

    let exists = client
        .query_opt("SELECT 1 FROM pg_database WHERE datname = $1", &[&db_name])
        .await?
        .is_some();

    if exists {
        log::info!("Database '{db_name}' already exists");
        return Ok(());
    }

    client
        .execute(format!("CREATE DATABASE \"{db_name}\"").as_str(), &[])
        .await?;
    log::info!("Database '{db_name}' created; run the migrate binary next");

    Ok(())
}
