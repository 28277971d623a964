use actix_web::{
    body::MessageBody,
    dev::ServiceResponse,
    http::{header, StatusCode},
    test,
    App,
};
use barterpay_engine::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    events::EventProducers,
    OrderStore,
    PaymentProvider,
    SqliteDatabase,
    TransactionCorrelator,
};
use bpg_common::Amount;
use log::debug;

use crate::{config::ServerConfig, server::configure_gateway};

pub const STORE_URL: &str = "https://shop.example.com";

/// A fresh, migrated database in the temp directory.
pub async fn test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let url = format!("sqlite://{}/bpg_server_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
    SqliteDatabase::create_if_missing(&url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to database");
    db.run_migrations().await.expect("Error running migrations");
    debug!("Created test database {url}");
    db
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.gateway.store_url = STORE_URL.to_string();
    config.gateway.currencies = vec!["USD".to_string()];
    config
}

pub async fn seed_order(db: &SqliteDatabase, order_id: &str, cents: i64) -> Order {
    let order = NewOrder::new(OrderId::new(order_id), Amount::from(cents), "USD")
        .with_order_key(&format!("wc_order_{order_id}"))
        .with_status(OrderStatusType::Pending);
    let (order, inserted) = db.insert_order(order).await.expect("Error inserting order");
    assert!(inserted);
    order
}

/// Seeds an order that has gone through checkout with the given transaction id.
pub async fn seed_pending_payment(db: &SqliteDatabase, order_id: &str, txid: &str) -> Order {
    let order = seed_order(db, order_id, 4999).await;
    TransactionCorrelator::new(db).bind(&order.order_id, txid).await.expect("Error binding transaction id");
    order
}

pub async fn fetch_status(db: &SqliteDatabase, order_id: &str) -> OrderStatusType {
    db.fetch_order(&OrderId::new(order_id)).await.expect("Error fetching order").expect("Order does not exist").status
}

/// Sends the request to a freshly configured gateway and returns the status, the `Location` header (if any) and the
/// body.
pub async fn send<P>(
    db: &SqliteDatabase,
    provider: P,
    req: test::TestRequest,
) -> (StatusCode, Option<String>, String)
where
    P: PaymentProvider + 'static,
{
    let config = test_config();
    let db = db.clone();
    let app = App::new().configure(move |cfg| configure_gateway(cfg, &config, db, provider, EventProducers::default()));
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    into_parts(res).await
}

async fn into_parts<B: MessageBody>(res: ServiceResponse<B>) -> (StatusCode, Option<String>, String) {
    let status = res.status();
    let location = res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).map(String::from);
    let body = test::read_body(res).await;
    (status, location, String::from_utf8_lossy(&body).into_owned())
}
