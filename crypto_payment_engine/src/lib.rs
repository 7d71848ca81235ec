//! Crypto Payment Engine
//!
//! The engine lets a merchant accept payment in several cryptocurrencies and detects, on the public blockchains, when
//! a payment for an order has arrived and is confirmed. It is provider-agnostic: orders live in a host order store,
//! and the engine only reads and writes a handful of metadata entries on them.
//!
//! The main pieces are:
//! 1. Chain adapters ([`mod@adapters`]), which report recent transactions for an address using public explorers.
//! 2. The [`mod@matcher`], which picks the transaction that pays for an order, within a 2% tolerance.
//! 3. The public API ([`mod@cpe_api`]): checkout, single-order reconciliation and throttled sweeps of all pending
//!    orders.
//! 4. A SQLite reference implementation of the host order store ([`SqliteDatabase`]).
//!
//! The engine emits events when a payment is detected or confirmed. Subscribe to them with [`events::EventHooks`].
pub mod adapters;
pub mod cpe_api;
pub mod db_types;
pub mod events;
pub mod matcher;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use adapters::{AdapterRegistry, ExplorerChainAdapter};
pub use cpe_api::{
    checkout_api::CheckoutApi,
    errors::{CheckoutError, ReconcileError},
    merchant_config::MerchantConfig,
    payment_objects::{PaymentInstructions, RateDisplay},
    reconcile_api::{CheckResult, ReconcileApi, ReconcileOutcome},
    sweeper::{SweepGuard, SweepTrigger, Sweeper, DEFAULT_SWEEP_CONCURRENCY, DEFAULT_SWEEP_INTERVAL},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{ChainAdapter, ChainAdapterError, OrderStore, OrderStoreError, QuoteError, RateProvider};
