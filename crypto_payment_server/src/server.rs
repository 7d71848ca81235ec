use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use crypto_payment_engine::{
    events::{EventHandlers, EventProducers},
    AdapterRegistry,
    CheckoutApi,
    RateProvider,
    ReconcileApi,
    SqliteDatabase,
    Sweeper,
};
use explorer_tools::QuoteApi;
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    hooks::create_event_hooks,
    middleware::{StorefrontSignatureFactory, SweepTriggerMiddlewareFactory},
    routes::{health, CheckOrderRoute, CheckoutRoute, OrderInstructionsRoute, RateRoute},
};

const EVENT_BUFFER_SIZE: usize = 128;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, create_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers();
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::InitializeError(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let adapters = AdapterRegistry::with_explorers(config.explorer.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let quotes = QuoteApi::new(&config.explorer.quote_api_url, config.explorer.timeout)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let rates: Arc<dyn RateProvider> = Arc::new(quotes);
    if config.merchant.payable_currencies().is_empty() {
        warn!("🪛️ No currency has a wallet address configured. Customers will not be able to pay in crypto.");
    }
    let reconciler = ReconcileApi::new(db.clone(), adapters, producers);
    // One sweeper (and one guard) shared by every worker
    let sweeper = Sweeper::new(reconciler.clone(), config.sweep_interval, config.sweep_concurrency);
    let checkout = CheckoutApi::new(db, rates, config.merchant.clone());
    let storefront = config.storefront.clone();
    let srv = HttpServer::new(move || {
        let storefront_scope = web::scope("/storefront")
            .wrap(StorefrontSignatureFactory::new(storefront.clone()))
            .service(CheckoutRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(SweepTriggerMiddlewareFactory::new(sweeper.clone(), &["/health"]))
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cpg::access_log"))
            .app_data(web::Data::new(checkout.clone()))
            .app_data(web::Data::new(reconciler.clone()))
            .app_data(web::Data::new(storefront.clone()))
            .service(health)
            .service(RateRoute::<SqliteDatabase>::new())
            .service(OrderInstructionsRoute::<SqliteDatabase>::new())
            .service(CheckOrderRoute::<SqliteDatabase>::new())
            .service(storefront_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
