use async_trait::async_trait;
use cpg_common::Currency;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum QuoteError {
    #[error("No exchange rate is available for {currency}. {reason}")]
    QuoteUnavailable { currency: Currency, reason: String },
}

/// Quotes the USD price of one whole coin.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rate(&self, currency: Currency) -> Result<Decimal, QuoteError>;
}
