use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use mongodb::Client;
use tracing_subscriber::EnvFilter;

use splitledger::config::Settings;
use splitledger::routes;
use splitledger::store::{LedgerStore, MongoStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env();
    tracing::info!(uri = %settings.mongodb_uri, "connecting to MongoDB");

    let client = Client::with_uri_str(&settings.mongodb_uri)
        .await
        .expect("failed to connect");
    let store = MongoStore::new(client.database(&settings.database_name));
    store
        .ensure_indexes()
        .await
        .expect("failed to create indexes");
    tracing::info!("connected");

    let store: Arc<dyn LedgerStore> = Arc::new(store);
    let store_data = web::Data::from(store);
    let settings_data = web::Data::new(settings.clone());

    let bind_address = settings.bind_address.clone();
    tracing::info!(%bind_address, "starting server");
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(store_data.clone())
            .app_data(settings_data.clone())
            .service(web::scope("/api/v1").configure(routes::api))
            .configure(routes::system)
    })
    .bind(bind_address)?
    .run()
    .await
}
