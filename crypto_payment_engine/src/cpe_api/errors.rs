use cpg_common::Currency;
use thiserror::Error;

use crate::{
    db_types::OrderId,
    traits::{OrderStoreError, QuoteError},
};

/// Failures while placing a crypto payment for an order. All of them are shown to the customer.
#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Payment in {0} is not available: {1}")]
    ConfigurationError(String, String),
    #[error("{0}")]
    QuoteUnavailable(#[from] QuoteError),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} is closed and cannot be paid")]
    OrderClosed(OrderId),
    #[error("Payment for order {order_id} has already been started in {currency}")]
    PaymentAlreadyStarted { order_id: OrderId, currency: Currency },
    #[error("Cannot compute a payment amount: {0}")]
    InvalidAmount(String),
    #[error("{0}")]
    StoreError(#[from] OrderStoreError),
}

impl CheckoutError {
    pub fn configuration<S: Into<String>>(what: &str, reason: S) -> Self {
        Self::ConfigurationError(what.to_string(), reason.into())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Could not record the reconciliation result. {0}")]
    StoreError(#[from] OrderStoreError),
}
