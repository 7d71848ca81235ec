use std::sync::Arc;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use cpg_common::Currency;
use crypto_payment_engine::{
    db_types::{meta_keys, OrderId, OrderStatusType},
    CheckoutApi,
    OrderStore,
    RateProvider,
    SqliteDatabase,
};
use rust_decimal_macros::dec;

use super::{
    helpers::{merchant, rates, send, sign, test_db, BTC_WALLET, SECRET},
    mocks::MockRateProvider,
};
use crate::{
    config::{StorefrontConfig, STOREFRONT_HMAC_HEADER},
    data_objects::InstructionsResponse,
    middleware::{StorefrontSignatureFactory, BAD_SIGNATURE, UNSIGNED_REQUEST},
    routes::CheckoutRoute,
};

const BTC_CHECKOUT: &str = r#"{"order_id":"1001","customer_id":"alice","fiat_total":"100.00","currency":"BTC"}"#;

fn configure(api: CheckoutApi<SqliteDatabase>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(api)).service(
            web::scope("/storefront")
                .wrap(StorefrontSignatureFactory::new(StorefrontConfig::new(SECRET, true)))
                .service(CheckoutRoute::<SqliteDatabase>::new()),
        );
    }
}

fn checkout_request(body: &'static str) -> TestRequest {
    TestRequest::post()
        .uri("/storefront/checkout")
        .insert_header(("Content-Type", "application/json"))
        .insert_header((STOREFRONT_HMAC_HEADER, sign(body)))
        .set_payload(body)
}

#[actix_web::test]
async fn checkout_places_crypto_payment() {
    let db = test_db().await;
    let api = CheckoutApi::new(db.clone(), rates(Some(dec!(50000))), merchant());
    let (status, body) = send(checkout_request(BTC_CHECKOUT), configure(api)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let instructions: InstructionsResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(instructions.order_id, OrderId::new("1001"));
    assert_eq!(instructions.currency, Currency::Btc);
    assert_eq!(instructions.amount, "0.00200000");
    assert_eq!(instructions.rate, "50000.00");
    assert_eq!(instructions.address, BTC_WALLET);
    assert_eq!(instructions.payment_uri, format!("bitcoin:{BTC_WALLET}?amount=0.00200000"));

    let order = db.fetch_order(&OrderId::new("1001")).await.unwrap().unwrap();
    assert_eq!(order.customer_id, "alice");
    assert_eq!(order.status, OrderStatusType::AwaitingPayment);
    assert_eq!(order.meta(meta_keys::CURRENCY), Some("BTC"));
    assert_eq!(order.meta(meta_keys::WALLET), Some(BTC_WALLET));
}

#[actix_web::test]
async fn repeated_checkout_keeps_the_original_quote() {
    let db = test_db().await;
    let mut provider = MockRateProvider::new();
    provider.expect_fetch_rate().times(1).returning(|_| Ok(dec!(50000)));
    let provider: Arc<dyn RateProvider> = Arc::new(provider);
    let api = CheckoutApi::new(db.clone(), provider, merchant());
    let (status, first) = send(checkout_request(BTC_CHECKOUT), configure(api.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = send(checkout_request(BTC_CHECKOUT), configure(api.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);

    // Switching currencies after the payment has started is refused
    const ETH_CHECKOUT: &str = r#"{"order_id":"1001","customer_id":"alice","fiat_total":"100.00","currency":"ETH"}"#;
    let (status, body) = send(checkout_request(ETH_CHECKOUT), configure(api)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[actix_web::test]
async fn unsigned_or_tampered_checkouts_are_rejected() {
    let db = test_db().await;
    let api = CheckoutApi::new(db.clone(), rates(Some(dec!(50000))), merchant());
    let req = TestRequest::post()
        .uri("/storefront/checkout")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(BTC_CHECKOUT);
    let (status, body) = send(req, configure(api.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, UNSIGNED_REQUEST);

    let tampered = r#"{"order_id":"1001","customer_id":"alice","fiat_total":"1.00","currency":"BTC"}"#;
    let req = TestRequest::post()
        .uri("/storefront/checkout")
        .insert_header(("Content-Type", "application/json"))
        .insert_header((STOREFRONT_HMAC_HEADER, sign(BTC_CHECKOUT)))
        .set_payload(tampered);
    let (status, body) = send(req, configure(api)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, BAD_SIGNATURE);
    assert!(db.fetch_order(&OrderId::new("1001")).await.unwrap().is_none());
}

#[actix_web::test]
async fn missing_wallet_is_a_configuration_error() {
    let db = test_db().await;
    let api = CheckoutApi::new(db.clone(), rates(Some(dec!(80))), merchant());
    const LTC_CHECKOUT: &str = r#"{"order_id":"1002","customer_id":"bob","fiat_total":"40","currency":"LTC"}"#;
    let (status, body) = send(checkout_request(LTC_CHECKOUT), configure(api)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(err["error"].as_str().unwrap().contains("LTC"), "{body}");
    // The order exists, but no payment was placed
    let order = db.fetch_order(&OrderId::new("1002")).await.unwrap().unwrap();
    assert!(order.meta(meta_keys::CURRENCY).is_none());
}

#[actix_web::test]
async fn quote_failures_block_checkout() {
    let db = test_db().await;
    let api = CheckoutApi::new(db.clone(), rates(None), merchant());
    let (status, body) = send(checkout_request(BTC_CHECKOUT), configure(api)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{body}");
    let order = db.fetch_order(&OrderId::new("1001")).await.unwrap().unwrap();
    assert!(order.meta(meta_keys::AMOUNT).is_none());
}

#[actix_web::test]
async fn checkout_for_someone_elses_order_is_forbidden() {
    let db = test_db().await;
    let api = CheckoutApi::new(db.clone(), rates(Some(dec!(50000))), merchant());
    let (status, _) = send(checkout_request(BTC_CHECKOUT), configure(api.clone())).await;
    assert_eq!(status, StatusCode::OK);
    const MALLORY: &str = r#"{"order_id":"1001","customer_id":"mallory","fiat_total":"100.00","currency":"BTC"}"#;
    let (status, body) = send(checkout_request(MALLORY), configure(api)).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
}
