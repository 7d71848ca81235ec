use std::{sync::Arc, time::Duration};

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use cpg_common::Currency;
use crypto_payment_engine::{
    db_types::{OrderId, OrderStatusType},
    events::EventProducers,
    test_utils::{create_crypto_order, tx, ScriptedChainAdapter},
    AdapterRegistry,
    CheckoutApi,
    OrderStore,
    ReconcileApi,
    SqliteDatabase,
    Sweeper,
};
use rust_decimal_macros::dec;

use super::helpers::{as_customer, merchant, rates, send, test_db, BTC_WALLET};
use crate::{
    data_objects::{CheckResponse, InstructionsResponse},
    middleware::SweepTriggerMiddlewareFactory,
    routes::{health, CheckOrderRoute, OrderInstructionsRoute, RateRoute},
};

struct Context {
    db: SqliteDatabase,
    adapter: ScriptedChainAdapter,
    checkout: CheckoutApi<SqliteDatabase>,
    reconciler: ReconcileApi<SqliteDatabase>,
}

async fn setup() -> Context {
    let db = test_db().await;
    let adapter = ScriptedChainAdapter::new(Currency::Btc);
    let mut adapters = AdapterRegistry::new();
    adapters.register(Arc::new(adapter.clone()));
    let reconciler = ReconcileApi::new(db.clone(), adapters, EventProducers::default());
    let checkout = CheckoutApi::new(db.clone(), rates(Some(dec!(50000))), merchant());
    create_crypto_order(&db, "2001", "alice", Currency::Btc, "0.002", BTC_WALLET).await;
    Context { db, adapter, checkout, reconciler }
}

fn configure(ctx: &Context) -> impl FnOnce(&mut ServiceConfig) {
    let checkout = ctx.checkout.clone();
    let reconciler = ctx.reconciler.clone();
    move |cfg| {
        cfg.app_data(web::Data::new(checkout))
            .app_data(web::Data::new(reconciler))
            .service(OrderInstructionsRoute::<SqliteDatabase>::new())
            .service(CheckOrderRoute::<SqliteDatabase>::new());
    }
}

#[actix_web::test]
async fn owner_fetches_instructions() {
    let ctx = setup().await;
    let req = as_customer(TestRequest::get().uri("/order/2001/instructions"), "alice");
    let (status, body) = send(req, configure(&ctx)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let instructions: InstructionsResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(instructions.amount, "0.00200000");
    assert_eq!(instructions.address, BTC_WALLET);
}

#[actix_web::test]
async fn instructions_need_a_valid_customer() {
    let ctx = setup().await;
    let req = TestRequest::get().uri("/order/2001/instructions");
    let (status, _) = send(req, configure(&ctx)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::get()
        .uri("/order/2001/instructions")
        .insert_header(("X-Cpg-Customer-Id", "alice"))
        .insert_header(("X-Cpg-Customer-Hmac", "Zm9yZ2Vk"));
    let (status, _) = send(req, configure(&ctx)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = as_customer(TestRequest::get().uri("/order/2001/instructions"), "mallory");
    let (status, body) = send(req, configure(&ctx)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Authentication Error. This order belongs to another customer."}"#);
}

#[actix_web::test]
async fn instructions_for_unknown_or_unpaid_orders() {
    let ctx = setup().await;
    let req = as_customer(TestRequest::get().uri("/order/9999/instructions"), "alice");
    let (status, _) = send(req, configure(&ctx)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let new_order = crypto_payment_engine::db_types::NewOrder::new(OrderId::new("2002"), "alice".into(), dec!(10));
    ctx.db.insert_order(new_order).await.unwrap();
    let req = as_customer(TestRequest::get().uri("/order/2002/instructions"), "alice");
    let (status, body) = send(req, configure(&ctx)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No crypto payment has been started"), "{body}");
}

#[actix_web::test]
async fn owner_checks_payment() {
    let ctx = setup().await;
    ctx.adapter.then_return(vec![]).then_return(vec![tx("abc123", "0.002", 1)]);

    let req = as_customer(TestRequest::post().uri("/order/2001/check"), "alice");
    let (status, body) = send(req, configure(&ctx)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let result: CheckResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(result.status, OrderStatusType::AwaitingPayment);
    assert_eq!(result.message, "Payment still pending. Checking blockchain...");

    let req = as_customer(TestRequest::post().uri("/order/2001/check"), "alice");
    let (status, body) = send(req, configure(&ctx)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let result: CheckResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(result.status, OrderStatusType::PaymentConfirmed);
    assert_eq!(result.message, "Payment confirmed!");
    assert_eq!(ctx.adapter.calls(), 2);
}

#[actix_web::test]
async fn strangers_cannot_trigger_checks() {
    let ctx = setup().await;
    ctx.adapter.then_return(vec![tx("abc123", "0.002", 1)]);
    let req = as_customer(TestRequest::post().uri("/order/2001/check"), "mallory");
    let (status, _) = send(req, configure(&ctx)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    // The reconciler was never reached
    assert_eq!(ctx.adapter.calls(), 0);
    let order = ctx.db.fetch_order(&OrderId::new("2001")).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::AwaitingPayment);
    assert!(order.observation().last_checked_at.is_none());
}

#[actix_web::test]
async fn page_loads_trigger_sweeps() {
    let ctx = setup().await;
    ctx.adapter.then_return(vec![tx("abc123", "0.002", 1)]);
    let sweeper = Sweeper::new(ctx.reconciler.clone(), Duration::from_secs(300), 2);
    let checkout = ctx.checkout.clone();
    let trigger = sweeper.clone();
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(
            web::scope("")
                .wrap(SweepTriggerMiddlewareFactory::new(trigger, &["/health"]))
                .app_data(web::Data::new(checkout))
                .service(health)
                .service(RateRoute::<SqliteDatabase>::new()),
        );
    };
    let (status, _) = send(TestRequest::get().uri("/health"), configure.clone()).await;
    assert_eq!(status, StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(sweeper.guard().last_sweep().is_none());
    assert_eq!(ctx.adapter.calls(), 0);

    let (status, _) = send(TestRequest::get().uri("/rate/BTC?fiat_total=10"), configure.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let mut order = ctx.db.fetch_order(&OrderId::new("2001")).await.unwrap().unwrap();
    for _ in 0..50 {
        if order.status == OrderStatusType::PaymentConfirmed {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        order = ctx.db.fetch_order(&OrderId::new("2001")).await.unwrap().unwrap();
    }
    assert_eq!(order.status, OrderStatusType::PaymentConfirmed);
    assert!(sweeper.guard().last_sweep().is_some());

    // Throttled until the interval has passed
    let (status, _) = send(TestRequest::get().uri("/rate/BTC?fiat_total=10"), configure).await;
    assert_eq!(status, StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(ctx.adapter.calls(), 1);
}
