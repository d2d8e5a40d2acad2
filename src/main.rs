mod access;
mod bulk;
mod cities;
mod clients;
mod config;
mod database;
mod handlers;
mod listing;
mod models;
mod pricing;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use crate::clients::checkout::CheckoutClient;
use crate::config::AppConfig;
use crate::database::DatabaseService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;
    let bind_address = config.bind_address();

    let db = DatabaseService::new(&config.database_url).await.map_err(|err| {
        log::error!("Failed to initialize database: {err:?}");
        std::io::Error::new(std::io::ErrorKind::Other, err)
    })?;

    let db_data = web::Data::new(db);
    let checkout_client = web::Data::new(CheckoutClient::new(config.checkout_service_url.clone()));
    let import_max_bytes = config.import_max_bytes;
    let config_data = web::Data::new(config);

    log::info!("Starting AC repair directory service on {}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(db_data.clone())
            .app_data(checkout_client.clone())
            .app_data(config_data.clone())
            .app_data(web::PayloadConfig::new(import_max_bytes))
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                web::scope("/api/v1")
                    // Health
                    .service(handlers::health_check)
                    // Bulk sheet import/export (registered before /businesses/{id})
                    .service(handlers::import_businesses)
                    .service(handlers::export_business_sheet)
                    // Businesses
                    .service(handlers::list_businesses)
                    .service(handlers::create_business)
                    .service(handlers::get_business)
                    .service(handlers::update_business)
                    .service(handlers::delete_business)
                    // Reviews
                    .service(handlers::list_business_reviews)
                    .service(handlers::create_review)
                    .service(handlers::list_reviews)
                    .service(handlers::set_review_verification)
                    // Quote requests
                    .service(handlers::create_quote)
                    .service(handlers::list_business_quotes)
                    // Roles & dashboards
                    .service(handlers::list_user_roles)
                    .service(handlers::assign_user_role)
                    .service(handlers::remove_user_role)
                    .service(handlers::get_user_dashboard)
                    .service(handlers::list_user_orders)
                    // Pricing & payments
                    .service(handlers::list_pricing)
                    .service(handlers::create_checkout)
                    .service(handlers::payment_success)
                    // Cities
                    .service(handlers::list_cities)
                    .service(handlers::get_city_page)
                    .service(handlers::lookup_zip),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}
