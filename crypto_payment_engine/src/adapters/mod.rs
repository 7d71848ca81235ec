//! Chain adapters and the currency → adapter registry.
//!
//! Adapters are picked by the currency recorded against an order, never by the look of the address.
mod explorer_adapter;
mod quote_provider;
mod registry;

pub use explorer_adapter::ExplorerChainAdapter;
pub use registry::AdapterRegistry;
