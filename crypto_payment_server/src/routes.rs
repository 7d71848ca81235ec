//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Explorer calls, quote calls and database access are all async, so
//! keep it that way.
use actix_web::{get, web, HttpResponse, Responder};
use cpg_common::Currency;
use crypto_payment_engine::{
    db_types::{Order, OrderId},
    CheckoutApi,
    OrderStore,
    PaymentInstructions,
    ReconcileApi,
};
use log::*;

use crate::{
    auth::CustomerIdentity,
    data_objects::{CheckResponse, CheckoutRequest, InstructionsResponse, RateQuery, RateResponse},
    errors::{AuthError, ServerError},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl OrderStore);
/// Route handler for the storefront checkout endpoint
///
/// The storefront calls this when a customer picks a cryptocurrency at checkout. The order is created if it does not
/// exist yet, and the crypto amount is fixed at the current rate. The response carries everything needed to show
/// payment instructions.
///
/// This route lives in the `/storefront` scope, so the request body must be signed by the storefront.
pub async fn checkout<B: OrderStore>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST checkout for order {} in {}", request.order_id, request.currency);
    let (order, inserted) = api.db().insert_order(request.new_order()).await?;
    if inserted {
        info!("💻️ New order {} for customer {}", order.order_id, order.customer_id);
    } else if order.customer_id != request.customer_id {
        warn!("💻️ Checkout for order {} came from a different customer than the order's owner", order.order_id);
        return Err(AuthError::NotOrderOwner.into());
    }
    let instructions = api.start_crypto_payment(&order.order_id, request.currency).await?;
    Ok(HttpResponse::Ok().json(InstructionsResponse::from(instructions)))
}

//----------------------------------------------   Rates  ----------------------------------------------------
route!(rate => Get "/rate/{currency}" impl OrderStore);
/// Route handler for display quotes
///
/// Returns how much of `currency` would pay for `fiat_total` USD at the current rate. Quote failures are reported in
/// the body, with `available: false` and a message for the customer, never as an HTTP error.
pub async fn rate<B: OrderStore>(
    path: web::Path<String>,
    query: web::Query<RateQuery>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let currency = path
        .into_inner()
        .parse::<Currency>()
        .map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
    trace!("💻️ GET rate for {currency}");
    let display = api.display_quote(currency, query.fiat_total).await;
    Ok(HttpResponse::Ok().json(RateResponse::from(display)))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_instructions => Get "/order/{order_id}/instructions" impl OrderStore);
/// Route handler for fetching the payment instructions of an order that has gone through crypto checkout
pub async fn order_instructions<B: OrderStore>(
    path: web::Path<OrderId>,
    customer: CustomerIdentity,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET instructions for order {order_id}");
    let order = fetch_owned_order(api.db(), &order_id, &customer).await?;
    let instructions = PaymentInstructions::try_from(&order).map_err(|e| {
        debug!("💻️ Order {order_id} has no usable payment instructions. {e}");
        ServerError::NoRecordFound(format!("No crypto payment has been started for order {order_id}"))
    })?;
    Ok(HttpResponse::Ok().json(InstructionsResponse::from(instructions)))
}

route!(check_order => Post "/order/{order_id}/check" impl OrderStore);
/// Route handler for the "check payment" button
///
/// Runs a single reconciliation for the order right away and reports its status. Only the customer that owns the
/// order may ask.
pub async fn check_order<B: OrderStore>(
    path: web::Path<OrderId>,
    customer: CustomerIdentity,
    api: web::Data<ReconcileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST check for order {order_id}");
    fetch_owned_order(api.db(), &order_id, &customer).await?;
    let result = api.check_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(CheckResponse::from(result)))
}

async fn fetch_owned_order<B: OrderStore>(
    db: &B,
    order_id: &OrderId,
    customer: &CustomerIdentity,
) -> Result<Order, ServerError> {
    let order = db.fetch_order(order_id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id}")))?;
    customer.check_owner(&order)?;
    Ok(order)
}
