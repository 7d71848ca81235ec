use async_trait::async_trait;
use cpg_common::Currency;
use crypto_payment_engine::{QuoteError, RateProvider};
use mockall::mock;
use rust_decimal::Decimal;

mock! {
    pub RateProvider {}
    #[async_trait]
    impl RateProvider for RateProvider {
        async fn fetch_rate(&self, currency: Currency) -> Result<Decimal, QuoteError>;
    }
}
