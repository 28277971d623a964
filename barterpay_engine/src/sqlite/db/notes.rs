use sqlx::SqliteConnection;

use crate::db_types::{OrderId, OrderNote};

pub async fn insert_note(
    order_id: &OrderId,
    note: &str,
    conn: &mut SqliteConnection,
) -> Result<OrderNote, sqlx::Error> {
    let note = sqlx::query_as("INSERT INTO order_notes (order_id, note) VALUES ($1, $2) RETURNING *")
        .bind(order_id.as_str())
        .bind(note)
        .fetch_one(conn)
        .await?;
    Ok(note)
}

/// All notes for the order, oldest first.
pub async fn fetch_notes(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderNote>, sqlx::Error> {
    let notes = sqlx::query_as("SELECT * FROM order_notes WHERE order_id = $1 ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(notes)
}
