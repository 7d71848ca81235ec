use async_trait::async_trait;
use cpg_common::Currency;
use explorer_tools::{ExplorerApi, NormalizedTransaction};
use log::*;

use crate::traits::{ChainAdapter, ChainAdapterError};

/// A [`ChainAdapter`] backed by a public block explorer.
///
/// The endpoint template and response family are selected by `currency`; see [`explorer_tools::ExplorerConfig`].
#[derive(Debug, Clone)]
pub struct ExplorerChainAdapter {
    currency: Currency,
    api: ExplorerApi,
}

impl ExplorerChainAdapter {
    pub fn new(currency: Currency, api: ExplorerApi) -> Self {
        Self { currency, api }
    }
}

#[async_trait]
impl ChainAdapter for ExplorerChainAdapter {
    fn currency(&self) -> Currency {
        self.currency
    }

    async fn fetch_transactions(&self, address: &str) -> Result<Vec<NormalizedTransaction>, ChainAdapterError> {
        self.api.fetch_transactions(self.currency, address).await.map_err(|e| {
            debug!("🔗️ {} explorer query for {address} failed. {e}", self.currency);
            ChainAdapterError::from(e)
        })
    }
}
