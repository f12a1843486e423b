use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};
use dotenvy::dotenv;

use pushkind_pos::change_feed::ChangeFeed;
use pushkind_pos::config::ServerConfig;
use pushkind_pos::db::establish_connection_pool;
use pushkind_pos::repository::DieselRepository;
use pushkind_pos::routes::api;
use pushkind_pos::services::payments::{InvoicePrinter, LogInvoicePrinter};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok(); // Load .env file

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let pool = match establish_connection_pool(&config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    let repo = DieselRepository::new(pool);
    let feed = ChangeFeed::new(config.change_feed_capacity);
    let printer: Arc<dyn InvoicePrinter> = Arc::new(LogInvoicePrinter);

    log::info!(
        "Orders open as {}, tips computed on the {} subtotal",
        config.initial_order_status,
        config.tip_base
    );

    let bind = (config.address.clone(), config.port);
    let config = web::Data::new(config);
    let printer = web::Data::from(printer);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(web::scope("/api").configure(api::configure))
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(feed.clone()))
            .app_data(config.clone())
            .app_data(printer.clone())
    })
    .bind(bind)?
    .run()
    .await
}
