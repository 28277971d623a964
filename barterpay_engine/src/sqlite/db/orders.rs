use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, StatusUpdate},
    traits::OrderStoreError,
};

/// Inserts the order into the database, returning `false` in the second parameter if the order already exists.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<(Order, bool), OrderStoreError> {
    let inserted = match fetch_order_by_order_id(&order.order_id, conn).await? {
        Some(order) => (order, false),
        None => {
            let order = insert_order(order, conn).await?;
            debug!("📝️ Order [{}] inserted with id {}", order.order_id, order.id);
            (order, true)
        },
    };
    Ok(inserted)
}

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                order_key,
                customer_id,
                total_price,
                currency,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.order_key)
    .bind(order.customer_id)
    .bind(order.total_price)
    .bind(order.currency)
    .bind(order.status)
    .bind(order.created_at)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(order)
}

/// Returns the entry in the orders table for the corresponding `order_id`
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches all orders carrying the metadata `key = value`, optionally restricted to the given statuses.
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn fetch_orders_by_meta(
    key: &str,
    value: &str,
    statuses: &[OrderStatusType],
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"
    SELECT * FROM orders WHERE order_id IN (SELECT order_id FROM order_meta WHERE meta_key =
    "#,
    );
    builder.push_bind(key.to_string());
    builder.push(" AND meta_value = ");
    builder.push_bind(value.to_string());
    builder.push(")");
    push_status_filter(&mut builder, statuses);
    builder.push(" ORDER BY created_at ASC");
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

/// Updates the order status, but only if the current status is one of `expected`. The check and the update happen in
/// a single statement, so concurrent callers cannot both succeed.
///
/// Returns `None` if the order was not in an expected status (or does not exist).
pub async fn update_status_if(
    order_id: &OrderId,
    expected: &[OrderStatusType],
    update: &StatusUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET status = ");
    builder.push_bind(update.new_status);
    builder.push(", updated_at = ");
    builder.push_bind(Utc::now());
    if let Some(reference) = &update.payment_reference {
        builder.push(", payment_reference = ");
        builder.push_bind(reference.clone());
    }
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id.as_str().to_string());
    push_status_filter(&mut builder, expected);
    builder.push(" RETURNING *");
    let order = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    Ok(order)
}

fn push_status_filter(builder: &mut QueryBuilder<'_, Sqlite>, statuses: &[OrderStatusType]) {
    if statuses.is_empty() {
        return;
    }
    builder.push(" AND status IN (");
    let mut list = builder.separated(", ");
    for status in statuses {
        list.push_bind(*status);
    }
    list.push_unseparated(")");
}
