use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use cpg_common::{CryptoAmount, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// The order metadata keys owned by the reconciliation engine.
pub mod meta_keys {
    pub const CURRENCY: &str = "crypto_currency";
    pub const AMOUNT: &str = "crypto_amount";
    pub const WALLET: &str = "crypto_wallet";
    pub const RATE: &str = "crypto_rate_usd";
    pub const TX_HASH: &str = "crypto_tx_hash";
    pub const CONFIRMATIONS: &str = "crypto_confirmations";
    pub const LAST_CHECKED_AT: &str = "crypto_last_checked_at";
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// Order status as far as the payment gateway is concerned.
///
/// `AwaitingPayment -> PaymentDetected -> PaymentConfirmed` is a one-way street. `Cancelled` is only ever set by the
/// host (e.g. the storefront closing an abandoned order) and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed and payment instructions were issued. Nothing has been seen on chain yet.
    AwaitingPayment,
    /// A matching transaction was seen, but it has not been confirmed yet.
    PaymentDetected,
    /// The matching transaction is confirmed and the order has been finalized.
    PaymentConfirmed,
    /// The order was closed by the host system.
    Cancelled,
}

pub const ALL_STATUSES: [OrderStatusType; 4] = [
    OrderStatusType::AwaitingPayment,
    OrderStatusType::PaymentDetected,
    OrderStatusType::PaymentConfirmed,
    OrderStatusType::Cancelled,
];

/// Orders in these states are candidates for reconciliation.
pub const PENDING_STATUSES: [OrderStatusType; 2] = [OrderStatusType::AwaitingPayment, OrderStatusType::PaymentDetected];

impl OrderStatusType {
    /// Position in the payment state machine. `Cancelled` sits outside it.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::AwaitingPayment => Some(0),
            Self::PaymentDetected => Some(1),
            Self::PaymentConfirmed => Some(2),
            Self::Cancelled => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        PENDING_STATUSES.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PaymentConfirmed | Self::Cancelled)
    }

    /// Whether an order may move from `self` to `new`. Staying put is always allowed.
    pub fn can_transition_to(&self, new: OrderStatusType) -> bool {
        if *self == new {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), new.rank()) {
            (Some(old), Some(new)) => new > old,
            // Pending orders can always be closed by the host
            (Some(_), None) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingPayment => "awaiting_payment",
            Self::PaymentDetected => "payment_detected",
            Self::PaymentConfirmed => "payment_confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_payment" => Ok(Self::AwaitingPayment),
            "payment_detected" => Ok(Self::PaymentDetected),
            "payment_confirmed" => Ok(Self::PaymentConfirmed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_id: String,
    /// The order total in the storefront's currency
    pub fiat_total: Decimal,
    pub fiat_currency: String,
}

impl NewOrder {
    pub fn new(order_id: OrderId, customer_id: String, fiat_total: Decimal) -> Self {
        Self { order_id, customer_id, fiat_total, fiat_currency: "USD".to_string() }
    }

    pub fn with_fiat_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.fiat_currency = currency.into();
        self
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: String,
    pub fiat_total: Decimal,
    pub fiat_currency: String,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    /// The transaction hash used as proof of payment when the order was finalized
    pub settlement_ref: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("Order metadata is missing '{0}'")]
    Missing(&'static str),
    #[error("Order metadata '{key}' has an invalid value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl Order {
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    /// True if this order was placed through the crypto payment flow
    pub fn is_crypto_order(&self) -> bool {
        self.meta(meta_keys::CURRENCY).is_some()
    }

    /// The payment this order is waiting for, read from its metadata.
    pub fn expected_payment(&self) -> Result<ExpectedPayment, MetadataError> {
        let currency = self
            .meta(meta_keys::CURRENCY)
            .ok_or(MetadataError::Missing(meta_keys::CURRENCY))?
            .parse::<Currency>()
            .map_err(|e| MetadataError::Invalid { key: meta_keys::CURRENCY, reason: e.to_string() })?;
        let amount = self
            .meta(meta_keys::AMOUNT)
            .ok_or(MetadataError::Missing(meta_keys::AMOUNT))?
            .parse::<CryptoAmount>()
            .map_err(|e| MetadataError::Invalid { key: meta_keys::AMOUNT, reason: e.to_string() })?;
        if amount.is_zero() {
            return Err(MetadataError::Invalid { key: meta_keys::AMOUNT, reason: "amount must be positive".into() });
        }
        let address = self.meta(meta_keys::WALLET).ok_or(MetadataError::Missing(meta_keys::WALLET))?.trim().to_string();
        Ok(ExpectedPayment { currency, amount, address })
    }

    /// What the engine has seen on chain for this order so far. Unparseable values are treated as absent.
    pub fn observation(&self) -> PaymentObservation {
        PaymentObservation {
            tx_hash: self.meta(meta_keys::TX_HASH).map(str::to_string),
            confirmations: self.meta(meta_keys::CONFIRMATIONS).and_then(|c| c.parse().ok()).unwrap_or(0),
            last_checked_at: self
                .meta(meta_keys::LAST_CHECKED_AT)
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc)),
        }
    }
}

/// The fixed, checkout-time half of an order's payment metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedPayment {
    pub currency: Currency,
    pub amount: CryptoAmount,
    pub address: String,
}

/// The reconciliation-time half of an order's payment metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentObservation {
    pub tx_hash: Option<String>,
    pub confirmations: u64,
    pub last_checked_at: Option<DateTime<Utc>>,
}
