//! Clients for the third-party read-only services the gateway depends on:
//!
//! * block explorers, which report the recent transactions for an address. Two response families are supported,
//!   UTXO-style (`{"txs": [...]}`) and Etherscan-style account lists (`{"result": [...]}`). Both are normalized into
//!   [`NormalizedTransaction`] values.
//! * the price quote API, which reports the USD price of a currency.
mod account_explorer;
mod api;
mod config;
mod data_objects;
mod error;
mod helpers;
mod quote;
mod utxo_explorer;

pub use account_explorer::{parse_account_response, AccountExplorerResponse, AccountTransaction};
pub use api::ExplorerApi;
pub use config::{ExplorerConfig, DEFAULT_EXPLORER_TIMEOUT, DEFAULT_QUOTE_API_URL, USDT_CONTRACT_ADDRESS};
pub use data_objects::NormalizedTransaction;
pub use error::ExplorerApiError;
pub use helpers::render_endpoint;
pub use quote::{parse_usd_price, QuoteApi};
pub use utxo_explorer::{parse_utxo_response, UtxoExplorerResponse, UtxoOutput, UtxoStatus, UtxoTransaction};
