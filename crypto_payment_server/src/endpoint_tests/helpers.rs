use std::sync::Arc;

use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App, ResponseError};
use cpg_common::Currency;
use crypto_payment_engine::{
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    MerchantConfig,
    QuoteError,
    RateProvider,
    SqliteDatabase,
};
use log::debug;
use rust_decimal::Decimal;

use super::mocks::MockRateProvider;
use crate::{
    config::{StorefrontConfig, CUSTOMER_HMAC_HEADER, CUSTOMER_ID_HEADER},
    helpers::calculate_hmac,
};

// Shared with the fake storefront in these tests. DO NOT re-use it anywhere.
pub const SECRET: &str = "5f0a7c1e9d7b4e3a8c6d2b1f0e9a8d7c";
pub const BTC_WALLET: &str = "bc1qmerchant0000000000000000000000000000";
pub const ETH_WALLET: &str = "0x00000000000000000000000000000000000000aa";

pub async fn test_db() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

pub fn merchant() -> MerchantConfig {
    MerchantConfig::default().with_wallet(Currency::Btc, BTC_WALLET).with_wallet(Currency::Eth, ETH_WALLET)
}

/// A rate provider that quotes `rate` for every currency, or fails if `rate` is `None`.
pub fn rates(rate: Option<Decimal>) -> Arc<dyn RateProvider> {
    let mut provider = MockRateProvider::new();
    provider.expect_fetch_rate().returning(move |currency| {
        rate.ok_or_else(|| QuoteError::QuoteUnavailable { currency, reason: "quote service is down".into() })
    });
    Arc::new(provider)
}

pub fn sign(data: &str) -> String {
    calculate_hmac(SECRET, data.as_bytes())
}

/// Add the storefront's signed customer headers to the request
pub fn as_customer(req: TestRequest, customer_id: &str) -> TestRequest {
    req.insert_header((CUSTOMER_ID_HEADER, customer_id)).insert_header((CUSTOMER_HMAC_HEADER, sign(customer_id)))
}

/// Run a single request against an app built by `configure`. Middleware errors are turned into responses the way the
/// server would.
pub async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().app_data(web::Data::new(StorefrontConfig::new(SECRET, true))).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}
