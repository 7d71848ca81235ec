use async_trait::async_trait;
use cpg_common::Currency;
use explorer_tools::{ExplorerApiError, NormalizedTransaction};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ChainAdapterError {
    #[error("No chain adapter is registered for {0}")]
    Unsupported(Currency),
    #[error("Explorer query failed. {0}")]
    ExplorerError(#[from] ExplorerApiError),
}

/// Reports the recent transactions for an address on a single chain.
///
/// Implementations must not retry. An error simply means "no observation this time".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// The currency this adapter serves
    fn currency(&self) -> Currency;

    /// Recent transactions paying `address`, most recent first.
    async fn fetch_transactions(&self, address: &str) -> Result<Vec<NormalizedTransaction>, ChainAdapterError>;
}
