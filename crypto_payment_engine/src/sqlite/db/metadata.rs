use std::collections::BTreeMap;

use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{meta_keys, OrderStatusType},
    traits::OrderStoreError,
};

/// All metadata entries for the order with primary key `id`
pub async fn fetch_metadata(id: i64, conn: &mut SqliteConnection) -> Result<BTreeMap<String, String>, OrderStoreError> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT meta_key, meta_value FROM order_metadata WHERE order_id = $1 ORDER BY meta_key")
            .bind(id)
            .fetch_all(conn)
            .await?;
    Ok(rows.into_iter().collect())
}

/// Insert or overwrite each entry in `fields`. This is not atomic on its own; wrap it in a transaction.
pub async fn upsert_metadata(
    id: i64,
    fields: &[(&str, String)],
    conn: &mut SqliteConnection,
) -> Result<(), OrderStoreError> {
    let now = Utc::now();
    for (key, value) in fields {
        sqlx::query(
            r#"
            INSERT INTO order_metadata (order_id, meta_key, meta_value, updated_at) VALUES ($1, $2, $3, $4)
            ON CONFLICT (order_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value, updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(*key)
        .bind(value.as_str())
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }
    trace!("🗃️ {} metadata entries saved for order #{id}", fields.len());
    Ok(())
}

/// Write `key = value` unless the order already has a non-blank `key` entry. Returns whether the entry was written.
///
/// A single statement, so of several racing callers exactly one succeeds.
pub async fn claim_metadata(
    id: i64,
    key: &str,
    value: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, OrderStoreError> {
    let res = sqlx::query(
        r#"
        INSERT INTO order_metadata (order_id, meta_key, meta_value, updated_at) VALUES ($1, $2, $3, $4)
        ON CONFLICT (order_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value, updated_at = excluded.updated_at
        WHERE TRIM(order_metadata.meta_value) = ''
        "#,
    )
    .bind(id)
    .bind(key)
    .bind(value)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

/// Bind a pending order to `tx_hash`, unless it is already bound to a different transaction. Returns whether the
/// binding holds after the call.
pub async fn bind_tx_hash(id: i64, tx_hash: &str, conn: &mut SqliteConnection) -> Result<bool, OrderStoreError> {
    let res = sqlx::query(
        r#"
        INSERT INTO order_metadata (order_id, meta_key, meta_value, updated_at)
        SELECT id, $2, $3, $4 FROM orders WHERE id = $1 AND status IN ($5, $6)
        ON CONFLICT (order_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value, updated_at = excluded.updated_at
        WHERE order_metadata.meta_value = excluded.meta_value OR TRIM(order_metadata.meta_value) = ''
        "#,
    )
    .bind(id)
    .bind(meta_keys::TX_HASH)
    .bind(tx_hash)
    .bind(Utc::now())
    .bind(OrderStatusType::AwaitingPayment.as_str())
    .bind(OrderStatusType::PaymentDetected.as_str())
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}
