use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use crypto_payment_engine::{cpe_api::checkout_api::RATE_UNAVAILABLE_MESSAGE, CheckoutApi, SqliteDatabase};
use rust_decimal_macros::dec;

use super::helpers::{merchant, rates, send, test_db};
use crate::{data_objects::RateResponse, routes::RateRoute};

fn configure(api: CheckoutApi<SqliteDatabase>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(api)).service(RateRoute::<SqliteDatabase>::new());
    }
}

#[actix_web::test]
async fn display_quote() {
    let api = CheckoutApi::new(test_db().await, rates(Some(dec!(2500))), merchant());
    let req = TestRequest::get().uri("/rate/eth?fiat_total=100");
    let (status, body) = send(req, configure(api)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let quote: RateResponse = serde_json::from_str(&body).unwrap();
    assert!(quote.available);
    assert_eq!(quote.rate.as_deref(), Some("2500.00"));
    assert_eq!(quote.amount.as_deref(), Some("0.04000000"));
    assert!(quote.message.is_none());
}

#[actix_web::test]
async fn unavailable_quotes_are_not_errors() {
    let api = CheckoutApi::new(test_db().await, rates(None), merchant());
    let req = TestRequest::get().uri("/rate/BTC?fiat_total=100");
    let (status, body) = send(req, configure(api)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let quote: RateResponse = serde_json::from_str(&body).unwrap();
    assert!(!quote.available);
    assert!(quote.rate.is_none());
    assert_eq!(quote.message.as_deref(), Some(RATE_UNAVAILABLE_MESSAGE));
}

#[actix_web::test]
async fn unknown_currency() {
    let api = CheckoutApi::new(test_db().await, rates(Some(dec!(1))), merchant());
    let req = TestRequest::get().uri("/rate/DOGE?fiat_total=100");
    let (status, body) = send(req, configure(api)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("DOGE"), "{body}");
}
