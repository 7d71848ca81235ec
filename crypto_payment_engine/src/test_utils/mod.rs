//! Helpers for tests in this crate and in crates that depend on it (with the `test_utils` feature).
pub mod prepare_env;
mod scripted_adapter;

use cpg_common::Currency;
use rust_decimal::Decimal;
pub use scripted_adapter::{tx, ScriptedChainAdapter};

use crate::{
    db_types::{meta_keys, NewOrder, Order, OrderId},
    traits::OrderStore,
};

/// Insert an order that went through crypto checkout: `amount` of `currency` is expected at `wallet`.
pub async fn create_crypto_order<B: OrderStore>(
    db: &B,
    order_id: &str,
    customer_id: &str,
    currency: Currency,
    amount: &str,
    wallet: &str,
) -> Order {
    let oid = OrderId::new(order_id);
    let new_order = NewOrder::new(oid.clone(), customer_id.to_string(), Decimal::ONE_HUNDRED);
    db.insert_order(new_order).await.expect("Error inserting order");
    let fields = [
        (meta_keys::CURRENCY, currency.code().to_string()),
        (meta_keys::AMOUNT, amount.to_string()),
        (meta_keys::WALLET, wallet.to_string()),
    ];
    db.save_order_metadata(&oid, &fields).await.expect("Error saving order metadata");
    db.fetch_order(&oid).await.expect("Error fetching order").expect("Order was not saved")
}
