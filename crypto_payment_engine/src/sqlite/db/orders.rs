use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use rust_decimal::Decimal;
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use super::metadata::fetch_metadata;
use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    traits::OrderStoreError,
};

/// An `orders` row, before the metadata is attached
#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    id: i64,
    order_id: String,
    customer_id: String,
    fiat_total: String,
    fiat_currency: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    settlement_ref: Option<String>,
}

impl OrderRow {
    async fn into_order(self, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
        let metadata = fetch_metadata(self.id, conn).await?;
        let fiat_total = Decimal::from_str(&self.fiat_total)
            .map_err(|e| OrderStoreError::InvalidData(format!("order {} total: {e}", self.order_id)))?;
        Ok(Order {
            id: self.id,
            order_id: OrderId(self.order_id),
            customer_id: self.customer_id,
            fiat_total,
            fiat_currency: self.fiat_currency,
            status: OrderStatusType::from_str(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            paid_at: self.paid_at,
            settlement_ref: self.settlement_ref,
            metadata,
        })
    }
}

/// Inserts the order into the database, returning `false` in the second parameter if the order already exists.
///
/// This is a single statement, so concurrent inserts of the same order are safe without a transaction.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<(Order, bool), OrderStoreError> {
    let now = Utc::now();
    let res = sqlx::query(
        r#"
            INSERT INTO orders (order_id, customer_id, fiat_total, fiat_currency, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (order_id) DO NOTHING;
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(order.customer_id.as_str())
    .bind(order.fiat_total.to_string())
    .bind(order.fiat_currency.as_str())
    .bind(OrderStatusType::AwaitingPayment.as_str())
    .bind(now)
    .execute(&mut *conn)
    .await?;
    let inserted = res.rows_affected() == 1;
    let stored = fetch_order_by_order_id(&order.order_id, conn)
        .await?
        .ok_or_else(|| OrderStoreError::OrderNotFound(order.order_id.clone()))?;
    if inserted {
        debug!("🗃️ Order {} inserted with id {}", stored.order_id, stored.id);
    }
    Ok((stored, inserted))
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderStoreError> {
    let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(row) => Ok(Some(row.into_order(conn).await?)),
        None => Ok(None),
    }
}

/// The primary key for `order_id`, if the order exists
pub async fn fetch_id(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<i64>, OrderStoreError> {
    let id: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(id.map(|(id,)| id))
}

/// Orders in one of `statuses` that have a non-blank `meta_key` entry, oldest first
pub async fn fetch_orders_by_status_and_meta(
    statuses: &[OrderStatusType],
    meta_key: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderStoreError> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE status IN (");
    let mut status_list = builder.separated(", ");
    for status in statuses {
        status_list.push_bind(status.as_str());
    }
    builder.push(") AND id IN (SELECT order_id FROM order_metadata WHERE meta_key = ");
    builder.push_bind(meta_key);
    builder.push(" AND TRIM(meta_value) <> '') ORDER BY created_at ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<OrderRow>().fetch_all(&mut *conn).await?;
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        orders.push(row.into_order(conn).await?);
    }
    trace!("🗃️ {} orders found with status in {statuses:?}", orders.len());
    Ok(orders)
}

/// Move the order to `status`, but only from one of the statuses in `from`. Returns whether a row was changed.
pub async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatusType,
    from: &[OrderStatusType],
    conn: &mut SqliteConnection,
) -> Result<bool, OrderStoreError> {
    if from.is_empty() {
        return Ok(false);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET status = ");
    builder.push_bind(status.as_str());
    builder.push(", updated_at = ");
    builder.push_bind(Utc::now());
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id.as_str());
    builder.push(" AND status IN (");
    let mut status_list = builder.separated(", ");
    for s in from {
        status_list.push_bind(s.as_str());
    }
    builder.push(")");
    trace!("🗃️ Executing query: {}", builder.sql());
    let res = builder.build().execute(conn).await?;
    Ok(res.rows_affected() == 1)
}

/// Record the payment against a pending order, but only if it hasn't been recorded yet. Returns whether a row was
/// changed.
pub async fn mark_paid(
    order_id: &OrderId,
    settlement_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, OrderStoreError> {
    let now = Utc::now();
    let res = sqlx::query(
        r#"
            UPDATE orders SET paid_at = $1, settlement_ref = $2, updated_at = $1
            WHERE order_id = $3 AND paid_at IS NULL AND status IN ($4, $5)
        "#,
    )
    .bind(now)
    .bind(settlement_ref)
    .bind(order_id.as_str())
    .bind(OrderStatusType::AwaitingPayment.as_str())
    .bind(OrderStatusType::PaymentDetected.as_str())
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}
