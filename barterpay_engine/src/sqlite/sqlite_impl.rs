//! `SqliteDatabase` is the bundled implementation of [`OrderStore`].
//!
//! Orders, their metadata and their audit notes live in three tables. Status transitions are conditional updates that
//! run in the same database transaction as the note that accompanies them.
//!
//! SQLite allows a single writer at a time. All writes from one `SqliteDatabase` (and its clones) are serialised on an
//! async mutex.
use std::{fmt::Debug, sync::Arc};

use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tokio::sync::Mutex;

use super::db::{db_url, new_pool, notes, order_meta, orders};
use crate::{
    db_types::{NewOrder, Order, OrderId, OrderNote, OrderStatusType, StatusUpdate},
    traits::{OrderStore, OrderStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderStore for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        if !result.1 {
            debug!("🗃️ Order {} already exists. Nothing was changed.", result.0.order_id);
        }
        Ok(result)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_by_meta(
        &self,
        key: &str,
        value: &str,
        statuses: &[OrderStatusType],
    ) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_by_meta(key, value, statuses, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_meta(&self, order_id: &OrderId, key: &str) -> Result<Option<String>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let value = order_meta::fetch_latest_meta(order_id, key, &mut conn).await?;
        Ok(value)
    }

    async fn add_meta(&self, order_id: &OrderId, key: &str, value: &str) -> Result<(), OrderStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        if orders::fetch_order_by_order_id(order_id, &mut tx).await?.is_none() {
            return Err(OrderStoreError::OrderNotFound(order_id.clone()));
        }
        order_meta::add_meta(order_id, key, value, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn add_note(&self, order_id: &OrderId, note: &str) -> Result<(), OrderStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        if orders::fetch_order_by_order_id(order_id, &mut tx).await?.is_none() {
            return Err(OrderStoreError::OrderNotFound(order_id.clone()));
        }
        let note = notes::insert_note(order_id, note, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Note {} added to order {order_id}", note.id);
        Ok(())
    }

    async fn fetch_notes(&self, order_id: &OrderId) -> Result<Vec<OrderNote>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let notes = notes::fetch_notes(order_id, &mut conn).await?;
        Ok(notes)
    }

    async fn transition_status(
        &self,
        order_id: &OrderId,
        expected: &[OrderStatusType],
        update: StatusUpdate,
    ) -> Result<Option<Order>, OrderStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        match orders::update_status_if(order_id, expected, &update, &mut tx).await? {
            Some(order) => {
                notes::insert_note(order_id, &update.note, &mut tx).await?;
                tx.commit().await?;
                debug!("🗃️ Order {order_id} moved to {}", order.status);
                Ok(Some(order))
            },
            None => {
                let existing = orders::fetch_order_by_order_id(order_id, &mut tx).await?;
                tx.rollback().await?;
                match existing {
                    Some(order) => {
                        debug!(
                            "🗃️ Order {order_id} is {} and cannot be moved to {}. Nothing was changed.",
                            order.status, update.new_status
                        );
                        Ok(None)
                    },
                    None => Err(OrderStoreError::OrderNotFound(order_id.clone())),
                }
            },
        }
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `BPG_DATABASE_URL` for the connection string.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool, write_lock: Arc::new(Mutex::new(())) })
    }

    /// Creates the SQLite database file if it does not exist yet. This must be called before [`Self::new_with_url`]
    /// for a fresh install.
    pub async fn create_if_missing(url: &str) -> Result<(), sqlx::Error> {
        if !Sqlite::database_exists(url).await? {
            info!("🗃️ Creating new database at {url}");
            Sqlite::create_database(url).await?;
        }
        Ok(())
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        debug!("🗃️ Migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Every value ever written for the metadata `key` on the order, oldest first.
    pub async fn fetch_meta_history(&self, order_id: &OrderId, key: &str) -> Result<Vec<String>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let values = order_meta::fetch_meta_history(order_id, key, &mut conn).await?;
        Ok(values)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
