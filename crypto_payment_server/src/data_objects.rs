use cpg_common::Currency;
use crypto_payment_engine::{
    db_types::{NewOrder, OrderId, OrderStatusType},
    CheckResult,
    PaymentInstructions,
    RateDisplay,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sent by the storefront when a customer chooses to pay for an order in crypto.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub order_id: OrderId,
    pub customer_id: String,
    pub fiat_total: Decimal,
    #[serde(default = "default_fiat_currency")]
    pub fiat_currency: String,
    pub currency: Currency,
}

fn default_fiat_currency() -> String {
    "USD".to_string()
}

impl CheckoutRequest {
    pub fn new_order(&self) -> NewOrder {
        NewOrder::new(self.order_id.clone(), self.customer_id.clone(), self.fiat_total)
            .with_fiat_currency(&self.fiat_currency)
    }
}

/// Payment instructions, formatted for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionsResponse {
    pub order_id: OrderId,
    pub currency: Currency,
    pub currency_label: String,
    /// Amount to send, with 8 decimal places
    pub amount: String,
    pub address: String,
    /// USD price of one coin, with 2 decimal places
    pub rate: String,
    pub payment_uri: String,
}

impl From<PaymentInstructions> for InstructionsResponse {
    fn from(value: PaymentInstructions) -> Self {
        Self {
            currency_label: value.currency.label().to_string(),
            amount: value.display_amount(),
            rate: value.display_rate(),
            order_id: value.order_id,
            currency: value.currency,
            address: value.address,
            payment_uri: value.payment_uri,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateQuery {
    pub fiat_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateResponse {
    pub currency: Currency,
    pub available: bool,
    pub rate: Option<String>,
    pub amount: Option<String>,
    pub message: Option<String>,
}

impl From<RateDisplay> for RateResponse {
    fn from(value: RateDisplay) -> Self {
        match value {
            RateDisplay::Available { currency, rate, amount } => Self {
                currency,
                available: true,
                rate: Some(format!("{:.2}", rate.round_dp(2))),
                amount: Some(amount.to_display()),
                message: None,
            },
            RateDisplay::Unavailable { currency, message } => {
                Self { currency, available: false, rate: None, amount: None, message: Some(message) }
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub message: String,
}

impl From<CheckResult> for CheckResponse {
    fn from(value: CheckResult) -> Self {
        Self { order_id: value.order_id, status: value.status, message: value.message }
    }
}
