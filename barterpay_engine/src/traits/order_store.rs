use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderId, OrderNote, OrderStatusType, StatusUpdate};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The value violates a uniqueness constraint. {0}")]
    DuplicateValue(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => Self::DuplicateValue(db.message().to_string()),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

/// The contract the reconciliation engine needs from the storefront's order storage.
///
/// Metadata is a multi-valued, append-only, string-keyed bag attached to each order. Reads return the most recently
/// added value for a key, but lookups by value match any value ever written, so that correlation ids from earlier
/// checkout attempts keep resolving to their order.
///
/// Implementations must guarantee that [`OrderStore::transition_status`] is atomic: two concurrent calls expecting the
/// same current status must never both succeed.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Stores a new order. This call is idempotent: if an order with the same `order_id` already exists, it is
    /// returned unchanged and the second element of the result is `false`.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Fetches all orders that have the metadata `key` set to `value`. If `statuses` is not empty, only orders
    /// currently in one of those statuses are returned.
    async fn fetch_orders_by_meta(
        &self,
        key: &str,
        value: &str,
        statuses: &[OrderStatusType],
    ) -> Result<Vec<Order>, OrderStoreError>;

    /// The most recently written value for `key`, if any.
    async fn fetch_meta(&self, order_id: &OrderId, key: &str) -> Result<Option<String>, OrderStoreError>;

    /// Appends a metadata value and persists it immediately.
    ///
    /// Returns [`OrderStoreError::DuplicateValue`] if the key is unique-valued (e.g. the external transaction id) and
    /// the value is already in use.
    async fn add_meta(&self, order_id: &OrderId, key: &str, value: &str) -> Result<(), OrderStoreError>;

    async fn add_note(&self, order_id: &OrderId, note: &str) -> Result<(), OrderStoreError>;

    async fn fetch_notes(&self, order_id: &OrderId) -> Result<Vec<OrderNote>, OrderStoreError>;

    /// Atomically moves the order to `update.new_status` and appends `update.note`, but only if the order's current
    /// status is one of `expected`.
    ///
    /// Returns the updated order, or `None` if the order was not in an expected status (nothing is changed in that
    /// case). Returns an error if the order does not exist.
    async fn transition_status(
        &self,
        order_id: &OrderId,
        expected: &[OrderStatusType],
        update: StatusUpdate,
    ) -> Result<Option<Order>, OrderStoreError>;
}
