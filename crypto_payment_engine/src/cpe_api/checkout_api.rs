use std::{fmt::Debug, sync::Arc};

use cpg_common::{CryptoAmount, Currency};
use log::*;
use rust_decimal::Decimal;

use crate::{
    cpe_api::{
        errors::CheckoutError,
        merchant_config::MerchantConfig,
        payment_objects::{PaymentInstructions, RateDisplay},
    },
    db_types::{meta_keys, Order, OrderId, OrderStatusType},
    traits::{OrderStore, QuoteError, RateProvider},
};

/// Amounts are quoted to the satoshi
pub const QUOTE_DECIMALS: u32 = 8;
pub const RATE_UNAVAILABLE_MESSAGE: &str = "Exchange rate currently unavailable. Please try again shortly.";

/// `CheckoutApi` fixes the crypto amount, currency and destination wallet for an order when the customer chooses to
/// pay in crypto.
#[derive(Clone)]
pub struct CheckoutApi<B> {
    db: B,
    rates: Arc<dyn RateProvider>,
    merchant: MerchantConfig,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi({:?})", self.merchant)
    }
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B, rates: Arc<dyn RateProvider>, merchant: MerchantConfig) -> Self {
        Self { db, rates, merchant }
    }

    pub fn merchant(&self) -> &MerchantConfig {
        &self.merchant
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CheckoutApi<B>
where B: OrderStore
{
    /// Start paying for `order_id` in `currency`.
    ///
    /// The expected amount is `fiat_total / rate`, rounded to 8 decimal places, and is fixed from here on. Calling this
    /// again for the same currency returns the existing instructions. Switching to another currency is refused.
    pub async fn start_crypto_payment(
        &self,
        order_id: &OrderId,
        currency: Currency,
    ) -> Result<PaymentInstructions, CheckoutError> {
        let order = self.db.fetch_order(order_id).await?.ok_or_else(|| CheckoutError::OrderNotFound(order_id.clone()))?;
        if order.status == OrderStatusType::Cancelled {
            return Err(CheckoutError::OrderClosed(order_id.clone()));
        }
        if order.meta(meta_keys::CURRENCY).is_some_and(|c| !c.trim().is_empty()) {
            debug!("💱️ Payment for order {order_id} was already started");
            return existing_instructions(&order, currency);
        }
        if !order.fiat_currency.eq_ignore_ascii_case("USD") {
            return Err(CheckoutError::configuration(
                currency.code(),
                format!("orders in {} cannot be quoted", order.fiat_currency),
            ));
        }
        let address = self.merchant.wallet_for(currency)?.to_string();
        let rate = self.rates.fetch_rate(currency).await.map_err(|e| {
            warn!("💱️ Cannot place order {order_id}. {e}");
            CheckoutError::QuoteUnavailable(e)
        })?;
        let amount = crypto_amount_for(order.fiat_total, rate, currency)?;
        let fields = [
            (meta_keys::CURRENCY, currency.code().to_string()),
            (meta_keys::AMOUNT, amount.to_display()),
            (meta_keys::WALLET, address.clone()),
            (meta_keys::RATE, rate.to_string()),
        ];
        // The currency entry is claimed atomically, so of two concurrent checkouts only one fixes the payment
        if !self.db.save_order_metadata_if_absent(order_id, meta_keys::CURRENCY, &fields).await? {
            debug!("💱️ Payment for order {order_id} was started by another request while this one was being quoted");
            let order =
                self.db.fetch_order(order_id).await?.ok_or_else(|| CheckoutError::OrderNotFound(order_id.clone()))?;
            return existing_instructions(&order, currency);
        }
        self.db.set_order_status(order_id, OrderStatusType::AwaitingPayment).await?;
        info!(
            "💱️ Order {order_id} will be paid with {} {currency} to {address} (1 {currency} = ${rate})",
            amount.to_display()
        );
        Ok(PaymentInstructions::new(order_id.clone(), currency, amount, address, rate))
    }

    /// A quote for display only. Failures turn into a "rate unavailable" message instead of an error.
    pub async fn display_quote(&self, currency: Currency, fiat_total: Decimal) -> RateDisplay {
        if !self.merchant.is_enabled(currency) {
            return RateDisplay::Unavailable { currency, message: format!("{} is not accepted", currency.label()) };
        }
        let quote = match self.rates.fetch_rate(currency).await {
            Ok(rate) => crypto_amount_for(fiat_total, rate, currency).map(|amount| (rate, amount)),
            Err(e) => Err(CheckoutError::QuoteUnavailable(e)),
        };
        match quote {
            Ok((rate, amount)) => RateDisplay::Available { currency, rate, amount },
            Err(e) => {
                debug!("💱️ No display quote for {currency}. {e}");
                RateDisplay::Unavailable { currency, message: RATE_UNAVAILABLE_MESSAGE.to_string() }
            },
        }
    }
}

/// The instructions an order was already given, provided the customer is asking for the same currency again.
fn existing_instructions(order: &Order, currency: Currency) -> Result<PaymentInstructions, CheckoutError> {
    let existing = order.expected_payment().map_err(|e| CheckoutError::InvalidAmount(e.to_string()))?;
    if existing.currency != currency {
        let order_id = order.order_id.clone();
        return Err(CheckoutError::PaymentAlreadyStarted { order_id, currency: existing.currency });
    }
    PaymentInstructions::try_from(order).map_err(|e| CheckoutError::InvalidAmount(e.to_string()))
}

/// `fiat_total / rate`, rounded to [`QUOTE_DECIMALS`]. The result must be positive.
pub fn crypto_amount_for(fiat_total: Decimal, rate: Decimal, currency: Currency) -> Result<CryptoAmount, CheckoutError> {
    if rate <= Decimal::ZERO {
        return Err(QuoteError::QuoteUnavailable { currency, reason: format!("{rate} is not a valid rate") }.into());
    }
    let amount = fiat_total
        .checked_div(rate)
        .ok_or_else(|| CheckoutError::InvalidAmount(format!("{fiat_total} / {rate} is out of range")))?
        .round_dp(QUOTE_DECIMALS);
    if amount <= Decimal::ZERO {
        return Err(CheckoutError::InvalidAmount(format!("{fiat_total} USD is {amount} {currency}")));
    }
    CryptoAmount::new(amount).map_err(|e| CheckoutError::InvalidAmount(e.to_string()))
}
