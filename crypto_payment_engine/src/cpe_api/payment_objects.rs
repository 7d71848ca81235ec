use cpg_common::{CryptoAmount, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db_types::{meta_keys, MetadataError, Order, OrderId};

/// Everything a storefront needs to render payment instructions (and a QR code) for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstructions {
    pub order_id: OrderId,
    pub currency: Currency,
    pub amount: CryptoAmount,
    pub address: String,
    /// USD price of one coin at checkout time
    pub rate: Decimal,
    pub payment_uri: String,
}

impl PaymentInstructions {
    pub fn new(order_id: OrderId, currency: Currency, amount: CryptoAmount, address: String, rate: Decimal) -> Self {
        let payment_uri = payment_uri(currency, &address, amount);
        Self { order_id, currency, amount, address, rate, payment_uri }
    }

    /// The amount, to 8 decimal places
    pub fn display_amount(&self) -> String {
        self.amount.to_display()
    }

    /// The rate, to 2 decimal places
    pub fn display_rate(&self) -> String {
        let rate = self.rate.round_dp(2);
        format!("{rate:.2}")
    }
}

/// `scheme:address?amount=0.00000000`, suitable for wallet links and QR codes
pub fn payment_uri(currency: Currency, address: &str, amount: CryptoAmount) -> String {
    format!("{}:{address}?amount={}", currency.uri_scheme(), amount.to_display())
}

impl TryFrom<&Order> for PaymentInstructions {
    type Error = MetadataError;

    fn try_from(order: &Order) -> Result<Self, Self::Error> {
        let expected = order.expected_payment()?;
        let rate = match order.meta(meta_keys::RATE) {
            Some(r) => r
                .parse::<Decimal>()
                .map_err(|e| MetadataError::Invalid { key: meta_keys::RATE, reason: e.to_string() })?,
            None => Decimal::ZERO,
        };
        Ok(Self::new(order.order_id.clone(), expected.currency, expected.amount, expected.address, rate))
    }
}

/// A display-time quote. Quote failures are not errors here; they turn into a message for the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RateDisplay {
    Available { currency: Currency, rate: Decimal, amount: CryptoAmount },
    Unavailable { currency: Currency, message: String },
}

impl RateDisplay {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}
