use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use barterpay_engine::{
    events::EventProducers,
    CheckoutApi,
    PaymentProvider,
    ReconciliationApi,
    SqliteDatabase,
    StatusApi,
};
use log::*;

use crate::{
    api_routes::{availability, CheckoutRoute, SyncOrderRoute},
    barterpay_routes::{
        BarterpayCallbackPostRoute,
        BarterpayCallbackRoute,
        BarterpayReturnRoute,
        BarterpayWebhookRoute,
    },
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::barterpay::{create_barterpay_event_handlers, BarterPayProvider},
    middleware::{HmacMiddlewareFactory, BARTERPAY_HMAC_HEADER, PLATFORM_HMAC_HEADER},
    routes::{health, OrderStatusPostRoute, OrderStatusRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    SqliteDatabase::create_if_missing(&config.database_url)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    info!("💻️ Using order database at {}", db.url());
    let handlers = create_barterpay_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers();
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let provider =
        BarterPayProvider::new(config.barterpay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("💻️ BarterPay deposit requests will be sent to {}", config.barterpay.endpoint());
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bpg::access_log"))
            .configure(|cfg| configure_gateway(cfg, &config, db.clone(), provider.clone(), producers.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// Registers the gateway's APIs and routes on an app. Every worker gets its own copy of the APIs, all sharing the same
/// order store.
pub fn configure_gateway<P>(
    cfg: &mut web::ServiceConfig,
    config: &ServerConfig,
    db: SqliteDatabase,
    provider: P,
    producers: EventProducers,
) where
    P: PaymentProvider + 'static,
{
    let reconciliation_api = ReconciliationApi::new(db.clone(), producers);
    let checkout_api = CheckoutApi::new(db.clone(), provider, config.gateway.checkout_config());
    let status_api = StatusApi::new(db.clone());
    let barterpay_scope = web::scope("/barterpay")
        .service(OrderStatusRoute::<SqliteDatabase>::new())
        .service(OrderStatusPostRoute::<SqliteDatabase>::new())
        .service(BarterpayReturnRoute::<SqliteDatabase>::new())
        .service(
            web::scope("")
                .wrap(HmacMiddlewareFactory::new(BARTERPAY_HMAC_HEADER, config.webhook_hmac_secret.clone()))
                .service(BarterpayWebhookRoute::<SqliteDatabase>::new())
                .service(BarterpayCallbackRoute::<SqliteDatabase>::new())
                .service(BarterpayCallbackPostRoute::<SqliteDatabase>::new()),
        );
    let api_scope = web::scope("/api")
        .wrap(HmacMiddlewareFactory::new(PLATFORM_HMAC_HEADER, config.platform_hmac_secret.clone()))
        .service(SyncOrderRoute::<SqliteDatabase>::new())
        .service(CheckoutRoute::<SqliteDatabase, P>::new())
        .service(availability);
    cfg.app_data(web::Data::new(reconciliation_api))
        .app_data(web::Data::new(checkout_api))
        .app_data(web::Data::new(status_api))
        .app_data(web::Data::new(db))
        .app_data(web::Data::new(config.gateway.clone()))
        .app_data(web::Data::new(config.gateway.availability()))
        .app_data(web::Data::new(ServerOptions::from_config(config)))
        .service(health)
        .service(barterpay_scope)
        .service(api_scope);
}
