use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::OrderId;

/// Appends a metadata value for the order. Earlier values for the same key are kept.
pub async fn add_meta(
    order_id: &OrderId,
    key: &str,
    value: &str,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO order_meta (order_id, meta_key, meta_value) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(order_id.as_str())
    .bind(key)
    .bind(value)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Meta {key}={value} added to order {order_id} (id {id})");
    Ok(id)
}

/// The most recently written value for `key` on the given order.
pub async fn fetch_latest_meta(
    order_id: &OrderId,
    key: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<String>, sqlx::Error> {
    let value = sqlx::query_scalar(
        "SELECT meta_value FROM order_meta WHERE order_id = $1 AND meta_key = $2 ORDER BY id DESC LIMIT 1",
    )
    .bind(order_id.as_str())
    .bind(key)
    .fetch_optional(conn)
    .await?;
    Ok(value)
}

/// Every value ever written for `key` on the given order, oldest first.
pub async fn fetch_meta_history(
    order_id: &OrderId,
    key: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<String>, sqlx::Error> {
    let values =
        sqlx::query_scalar("SELECT meta_value FROM order_meta WHERE order_id = $1 AND meta_key = $2 ORDER BY id")
            .bind(order_id.as_str())
            .bind(key)
            .fetch_all(conn)
            .await?;
    Ok(values)
}
