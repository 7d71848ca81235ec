//! `SqliteDatabase` is the reference host order store for the payment engine.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, metadata, new_pool, orders};
use crate::{
    db_types::{meta_keys, NewOrder, Order, OrderId, OrderStatusType, ALL_STATUSES},
    traits::{OrderStore, OrderStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderStore for SqliteDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_order_id(order_id, &mut conn).await
    }

    async fn fetch_orders_by_status_and_meta(
        &self,
        statuses: &[OrderStatusType],
        required_meta_key: &str,
    ) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_by_status_and_meta(statuses, required_meta_key, &mut conn).await
    }

    async fn save_order_metadata(&self, order_id: &OrderId, fields: &[(&str, String)]) -> Result<(), OrderStoreError> {
        let id = self.fetch_id(order_id).await?;
        // Writes only, so the transaction never has to upgrade a read lock
        let mut tx = self.pool.begin().await?;
        metadata::upsert_metadata(id, fields, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_order_metadata_if_absent(
        &self,
        order_id: &OrderId,
        guard_key: &str,
        fields: &[(&str, String)],
    ) -> Result<bool, OrderStoreError> {
        let guard_value = fields
            .iter()
            .find_map(|(k, v)| (*k == guard_key).then_some(v.as_str()))
            .ok_or_else(|| OrderStoreError::InvalidData(format!("{guard_key} is not one of the fields to save")))?;
        let id = self.fetch_id(order_id).await?;
        // The claim is the first statement, so the write lock is taken before anything else happens
        let mut tx = self.pool.begin().await?;
        if !metadata::claim_metadata(id, guard_key, guard_value, &mut tx).await? {
            trace!("🗃️ Order {order_id} already has a {guard_key} entry. Nothing saved");
            return Ok(false);
        }
        let rest = fields.iter().filter(|(k, _)| *k != guard_key).cloned().collect::<Vec<_>>();
        metadata::upsert_metadata(id, &rest, &mut tx).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn record_payment_observation(
        &self,
        order_id: &OrderId,
        tx_hash: &str,
        confirmations: u64,
    ) -> Result<bool, OrderStoreError> {
        let id = self.fetch_id(order_id).await?;
        let mut tx = self.pool.begin().await?;
        if !metadata::bind_tx_hash(id, tx_hash, &mut tx).await? {
            debug!("🗃️ Order {order_id} is closed or bound to another payment. {tx_hash} was not recorded");
            return Ok(false);
        }
        metadata::upsert_metadata(id, &[(meta_keys::CONFIRMATIONS, confirmations.to_string())], &mut tx).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn set_order_status(&self, order_id: &OrderId, status: OrderStatusType) -> Result<Order, OrderStoreError> {
        let from = ALL_STATUSES.iter().copied().filter(|s| *s != status && s.can_transition_to(status)).collect::<Vec<_>>();
        let mut conn = self.pool.acquire().await?;
        let changed = orders::update_order_status(order_id, status, &from, &mut conn).await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn)
            .await?
            .ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()))?;
        if changed {
            debug!("🗃️ Order {order_id} is now {status}");
            Ok(order)
        } else if order.status == status {
            trace!("🗃️ Order {order_id} is already {status}");
            Ok(order)
        } else {
            warn!("🗃️ Refusing to move order {order_id} from {} to {status}", order.status);
            Err(OrderStoreError::ForbiddenStatusChange { order_id: order_id.clone(), from: order.status, to: status })
        }
    }

    async fn finalize_order_payment(&self, order_id: &OrderId, settlement_ref: &str) -> Result<bool, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let finalized = orders::mark_paid(order_id, settlement_ref, &mut conn).await?;
        if finalized {
            debug!("🗃️ Order {order_id} marked as paid. Settlement reference: {settlement_ref}");
        } else if orders::fetch_id(order_id, &mut conn).await?.is_none() {
            return Err(OrderStoreError::OrderNotFound(order_id.clone()));
        }
        Ok(finalized)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::idempotent_insert(order, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `CPG_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Bring the schema up to date. Safe to call on every start-up.
    pub async fn migrate(&self) -> Result<(), OrderStoreError> {
        sqlx::migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| OrderStoreError::DatabaseError(format!("Migrations failed. {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// The primary key for the order. Read on a pooled connection, outside any write transaction.
    async fn fetch_id(&self, order_id: &OrderId) -> Result<i64, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_id(order_id, &mut conn).await?.ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()))
    }
}

#[cfg(test)]
mod test {
    use cpg_common::Currency;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        db_types::{meta_keys, PENDING_STATUSES},
        test_utils::{
            create_crypto_order,
            prepare_env::{prepare_test_env, random_db_path, tear_down},
        },
    };

    #[tokio::test]
    async fn insert_is_idempotent() {
        let db = prepare_test_env(&random_db_path()).await;
        let order = NewOrder::new(OrderId::new("100"), "alice".into(), dec!(49.99));
        let (first, inserted) = db.insert_order(order.clone()).await.unwrap();
        assert!(inserted);
        assert_eq!(first.status, OrderStatusType::AwaitingPayment);
        assert_eq!(first.fiat_total, dec!(49.99));
        assert_eq!(first.fiat_currency, "USD");
        let (second, inserted) = db.insert_order(order).await.unwrap();
        assert!(!inserted);
        assert_eq!(first.id, second.id);
        tear_down(db).await;
    }

    #[tokio::test]
    async fn metadata_upserts() {
        let db = prepare_test_env(&random_db_path()).await;
        let order = create_crypto_order(&db, "101", "bob", Currency::Ltc, "1.5", "ltc1q").await;
        assert_eq!(order.meta(meta_keys::AMOUNT), Some("1.5"));
        db.save_order_metadata(&order.order_id, &[(meta_keys::AMOUNT, "1.6".into()), ("note", "hi".into())])
            .await
            .unwrap();
        let order = db.fetch_order(&order.order_id).await.unwrap().unwrap();
        assert_eq!(order.meta(meta_keys::AMOUNT), Some("1.6"));
        assert_eq!(order.meta(meta_keys::WALLET), Some("ltc1q"));
        assert_eq!(order.meta("note"), Some("hi"));
        let err = db.save_order_metadata(&OrderId::new("missing"), &[("a", "b".into())]).await.unwrap_err();
        assert!(matches!(err, OrderStoreError::OrderNotFound(_)));
        tear_down(db).await;
    }

    #[tokio::test]
    async fn status_never_regresses() {
        use OrderStatusType::*;
        let db = prepare_test_env(&random_db_path()).await;
        let oid = create_crypto_order(&db, "102", "carol", Currency::Btc, "0.1", "bc1q").await.order_id;
        assert_eq!(db.set_order_status(&oid, PaymentDetected).await.unwrap().status, PaymentDetected);
        assert_eq!(db.set_order_status(&oid, PaymentDetected).await.unwrap().status, PaymentDetected);
        let err = db.set_order_status(&oid, AwaitingPayment).await.unwrap_err();
        assert!(matches!(err, OrderStoreError::ForbiddenStatusChange { from: PaymentDetected, to: AwaitingPayment, .. }));
        assert_eq!(db.set_order_status(&oid, PaymentConfirmed).await.unwrap().status, PaymentConfirmed);
        assert!(db.set_order_status(&oid, Cancelled).await.is_err());
        let err = db.set_order_status(&OrderId::new("nope"), Cancelled).await.unwrap_err();
        assert!(matches!(err, OrderStoreError::OrderNotFound(_)));
        tear_down(db).await;
    }

    #[tokio::test]
    async fn finalization_happens_once() {
        let db = prepare_test_env(&random_db_path()).await;
        let oid = create_crypto_order(&db, "103", "dave", Currency::Eth, "1", "0xd").await.order_id;
        assert!(db.finalize_order_payment(&oid, "0xfeed").await.unwrap());
        assert!(!db.finalize_order_payment(&oid, "0xbeef").await.unwrap());
        let order = db.fetch_order(&oid).await.unwrap().unwrap();
        assert_eq!(order.settlement_ref.as_deref(), Some("0xfeed"));
        assert!(db.finalize_order_payment(&OrderId::new("nope"), "0x").await.is_err());
        // closed orders are never finalized
        let closed = create_crypto_order(&db, "103b", "dave", Currency::Eth, "1", "0xd").await.order_id;
        db.set_order_status(&closed, OrderStatusType::Cancelled).await.unwrap();
        assert!(!db.finalize_order_payment(&closed, "0xfeed").await.unwrap());
        let order = db.fetch_order(&closed).await.unwrap().unwrap();
        assert!(order.paid_at.is_none());
        assert!(order.settlement_ref.is_none());
        tear_down(db).await;
    }

    #[tokio::test]
    async fn payment_binding_is_permanent() {
        let db = prepare_test_env(&random_db_path()).await;
        let oid = create_crypto_order(&db, "109", "gina", Currency::Btc, "0.1", "bc1q").await.order_id;
        assert!(db.record_payment_observation(&oid, "aaaa", 0).await.unwrap());
        assert!(db.record_payment_observation(&oid, "aaaa", 1).await.unwrap());
        assert!(!db.record_payment_observation(&oid, "bbbb", 3).await.unwrap());
        let order = db.fetch_order(&oid).await.unwrap().unwrap();
        assert_eq!(order.observation().tx_hash.as_deref(), Some("aaaa"));
        assert_eq!(order.observation().confirmations, 1);

        let done = create_crypto_order(&db, "110", "gina", Currency::Btc, "0.1", "bc1q").await.order_id;
        db.set_order_status(&done, OrderStatusType::PaymentConfirmed).await.unwrap();
        assert!(!db.record_payment_observation(&done, "cccc", 1).await.unwrap());
        let order = db.fetch_order(&done).await.unwrap().unwrap();
        assert!(order.observation().tx_hash.is_none());
        let err = db.record_payment_observation(&OrderId::new("nope"), "aaaa", 1).await.unwrap_err();
        assert!(matches!(err, OrderStoreError::OrderNotFound(_)));
        tear_down(db).await;
    }

    #[tokio::test]
    async fn guarded_metadata_is_written_once() {
        let db = prepare_test_env(&random_db_path()).await;
        let oid = OrderId::new("111");
        db.insert_order(NewOrder::new(oid.clone(), "hank".into(), dec!(20))).await.unwrap();
        db.save_order_metadata(&oid, &[(meta_keys::CURRENCY, "".into())]).await.unwrap();
        let eth = [(meta_keys::CURRENCY, "ETH".to_string()), (meta_keys::WALLET, "0xe".to_string())];
        let btc = [(meta_keys::CURRENCY, "BTC".to_string()), (meta_keys::WALLET, "bc1q".to_string())];
        let (a, b) = tokio::join!(
            db.save_order_metadata_if_absent(&oid, meta_keys::CURRENCY, &eth),
            db.save_order_metadata_if_absent(&oid, meta_keys::CURRENCY, &btc)
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a ^ b);
        let order = db.fetch_order(&oid).await.unwrap().unwrap();
        let expected = if a { ("ETH", "0xe") } else { ("BTC", "bc1q") };
        assert_eq!(order.meta(meta_keys::CURRENCY), Some(expected.0));
        assert_eq!(order.meta(meta_keys::WALLET), Some(expected.1));
        let err = db.save_order_metadata_if_absent(&oid, "missing_key", &eth).await.unwrap_err();
        assert!(matches!(err, OrderStoreError::InvalidData(_)));
        tear_down(db).await;
    }

    #[tokio::test]
    async fn candidate_orders() {
        let db = prepare_test_env(&random_db_path()).await;
        create_crypto_order(&db, "104", "erin", Currency::Btc, "0.1", "bc1q").await;
        let detected = create_crypto_order(&db, "105", "erin", Currency::Btc, "0.2", "bc1q").await;
        db.set_order_status(&detected.order_id, OrderStatusType::PaymentDetected).await.unwrap();
        let done = create_crypto_order(&db, "106", "erin", Currency::Btc, "0.3", "bc1q").await;
        db.set_order_status(&done.order_id, OrderStatusType::PaymentConfirmed).await.unwrap();
        db.insert_order(NewOrder::new(OrderId::new("107"), "erin".into(), dec!(5))).await.unwrap();
        let blank = NewOrder::new(OrderId::new("108"), "erin".into(), dec!(5));
        db.insert_order(blank).await.unwrap();
        db.save_order_metadata(&OrderId::new("108"), &[(meta_keys::CURRENCY, " ".into())]).await.unwrap();

        let pending = db.fetch_orders_by_status_and_meta(&PENDING_STATUSES, meta_keys::CURRENCY).await.unwrap();
        let ids = pending.iter().map(|o| o.order_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["104", "105"]);
        assert!(db.fetch_orders_by_status_and_meta(&[], meta_keys::CURRENCY).await.unwrap().is_empty());
        tear_down(db).await;
    }
}
