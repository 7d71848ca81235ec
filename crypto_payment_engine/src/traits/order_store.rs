use thiserror::Error;

use crate::db_types::{ConversionError, MetadataError, NewOrder, Order, OrderId, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    ForbiddenStatusChange { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Stored order data is invalid: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

impl From<ConversionError> for OrderStoreError {
    fn from(e: ConversionError) -> Self {
        OrderStoreError::InvalidData(e.to_string())
    }
}

impl From<MetadataError> for OrderStoreError {
    fn from(e: MetadataError) -> Self {
        OrderStoreError::InvalidData(e.to_string())
    }
}

/// The host order store.
///
/// Orders belong to the host. The engine treats their metadata as a flat string map and owns the keys in
/// [`crate::db_types::meta_keys`].
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// Fetch an order, including its metadata.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// All orders whose status is one of `statuses` and which carry a non-empty `required_meta_key` entry, oldest first.
    async fn fetch_orders_by_status_and_meta(
        &self,
        statuses: &[OrderStatusType],
        required_meta_key: &str,
    ) -> Result<Vec<Order>, OrderStoreError>;

    /// Upsert each of the given metadata entries. Other keys are left alone.
    async fn save_order_metadata(&self, order_id: &OrderId, fields: &[(&str, String)]) -> Result<(), OrderStoreError>;

    /// Save `fields` only if the order has no non-blank `guard_key` entry yet. `guard_key` must be one of `fields`.
    ///
    /// Returns `true` if the fields were written. When several callers race, exactly one of them wins.
    async fn save_order_metadata_if_absent(
        &self,
        order_id: &OrderId,
        guard_key: &str,
        fields: &[(&str, String)],
    ) -> Result<bool, OrderStoreError>;

    /// Bind the order to the payment `tx_hash` and record its confirmation count.
    ///
    /// Nothing is written unless the order is still pending and is either unbound or already bound to `tx_hash`.
    /// Returns whether the observation was recorded.
    async fn record_payment_observation(
        &self,
        order_id: &OrderId,
        tx_hash: &str,
        confirmations: u64,
    ) -> Result<bool, OrderStoreError>;

    /// Set the order status and return the updated order.
    ///
    /// Setting the current status again is a no-op. Moving backwards, or out of a terminal state, fails with
    /// [`OrderStoreError::ForbiddenStatusChange`].
    async fn set_order_status(&self, order_id: &OrderId, status: OrderStatusType) -> Result<Order, OrderStoreError>;

    /// Mark a pending order as paid, recording `settlement_ref` as proof of payment.
    ///
    /// Returns `true` only for the call that actually finalized the order. Every later call, and any call for an order
    /// that is no longer pending, returns `false` and changes nothing.
    async fn finalize_order_payment(&self, order_id: &OrderId, settlement_ref: &str) -> Result<bool, OrderStoreError>;

    /// Store a new order in `AwaitingPayment` status. This call is idempotent.
    ///
    /// Returns the stored order, and whether it was inserted (`false` if it already existed).
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError>;
}
