use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// A matching transaction was seen for the first time, but it is not confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetectedEvent {
    pub order: Order,
    pub tx_hash: String,
    pub confirmations: u64,
}

impl PaymentDetectedEvent {
    pub fn new(order: Order, tx_hash: String, confirmations: u64) -> Self {
        Self { order, tx_hash, confirmations }
    }
}

/// The order's payment is confirmed and the order has been finalized. Published once per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmedEvent {
    pub order: Order,
    pub tx_hash: String,
    pub confirmations: u64,
}

impl PaymentConfirmedEvent {
    pub fn new(order: Order, tx_hash: String, confirmations: u64) -> Self {
        Self { order, tx_hash, confirmations }
    }
}
