use barterpay_engine::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    OrderStore,
    SqliteDatabase,
};
use bpg_common::Amount;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// Creates a fresh, migrated database at `url`. Any existing database at that location is dropped first.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Could not drop database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    info!("🚀️ Created test database {url}");
    db
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/bpg_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn seed_order(db: &SqliteDatabase, order_id: &str, cents: i64, status: OrderStatusType) -> Order {
    let order = NewOrder::new(OrderId::new(order_id), Amount::from(cents), "USD")
        .with_order_key(&format!("wc_order_{order_id}"))
        .with_customer_id("alice")
        .with_status(status);
    let (order, inserted) = db.insert_order(order).await.expect("Error inserting order");
    assert!(inserted);
    order
}
