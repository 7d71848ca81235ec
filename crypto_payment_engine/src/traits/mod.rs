//! # Capability interfaces
//!
//! The engine talks to the outside world through three traits:
//!
//! * [`OrderStore`] is the host's order store. The engine only reads the expected-payment metadata and writes the
//!   observation metadata and status. [`crate::SqliteDatabase`] is the reference implementation.
//! * [`ChainAdapter`] reports recent transactions for an address on one chain.
//! * [`RateProvider`] quotes the USD price of a currency.
mod chain_adapter;
mod order_store;
mod rate_provider;

#[cfg(test)]
pub use chain_adapter::MockChainAdapter;
pub use chain_adapter::{ChainAdapter, ChainAdapterError};
pub use order_store::{OrderStore, OrderStoreError};
#[cfg(test)]
pub use rate_provider::MockRateProvider;
pub use rate_provider::{QuoteError, RateProvider};
