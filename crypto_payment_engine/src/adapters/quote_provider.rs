use async_trait::async_trait;
use cpg_common::Currency;
use explorer_tools::QuoteApi;
use rust_decimal::Decimal;

use crate::traits::{QuoteError, RateProvider};

#[async_trait]
impl RateProvider for QuoteApi {
    async fn fetch_rate(&self, currency: Currency) -> Result<Decimal, QuoteError> {
        self.fetch_usd_price(currency)
            .await
            .map_err(|e| QuoteError::QuoteUnavailable { currency, reason: e.to_string() })
    }
}
