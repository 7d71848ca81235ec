//! Default event hooks for the server.
//!
//! The gateway does not notify anyone itself. It records payment progress in the order log, so that operators can
//! follow along, and leaves notifications to whatever watches the order store.
use crypto_payment_engine::events::EventHooks;
use log::*;

pub fn create_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_payment_detected(|ev| {
        Box::pin(async move {
            info!(
                "📬️ Payment detected for order {}: {} with {} confirmations. Waiting for confirmation.",
                ev.order.order_id, ev.tx_hash, ev.confirmations
            );
        })
    });
    hooks.on_payment_confirmed(|ev| {
        Box::pin(async move {
            info!(
                "📬️ Order {} has been paid in full. Transaction {} ({} confirmations)",
                ev.order.order_id, ev.tx_hash, ev.confirmations
            );
        })
    });
    hooks
}
