use std::{collections::HashMap, fmt::Debug, sync::Arc};

use cpg_common::{Currency, ALL_CURRENCIES};
use explorer_tools::{ExplorerApi, ExplorerConfig};
use log::*;

use crate::{
    adapters::ExplorerChainAdapter,
    traits::{ChainAdapter, ChainAdapterError},
};

/// Maps each currency to the chain adapter that serves it.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Currency, Arc<dyn ChainAdapter>>,
}

impl Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdapterRegistry({:?})", self.currencies())
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with an explorer-backed adapter for every supported currency, sharing one HTTP client.
    pub fn with_explorers(config: ExplorerConfig) -> Result<Self, ChainAdapterError> {
        let api = ExplorerApi::new(config)?;
        let mut registry = Self::new();
        for currency in ALL_CURRENCIES {
            registry.register(Arc::new(ExplorerChainAdapter::new(currency, api.clone())));
        }
        Ok(registry)
    }

    /// Register `adapter` for the currency it reports, replacing any previous adapter for that currency.
    pub fn register(&mut self, adapter: Arc<dyn ChainAdapter>) -> &mut Self {
        let currency = adapter.currency();
        if self.adapters.insert(currency, adapter).is_some() {
            info!("🔗️ Replaced the chain adapter for {currency}");
        } else {
            debug!("🔗️ Registered a chain adapter for {currency}");
        }
        self
    }

    pub fn get(&self, currency: Currency) -> Result<Arc<dyn ChainAdapter>, ChainAdapterError> {
        self.adapters.get(&currency).cloned().ok_or(ChainAdapterError::Unsupported(currency))
    }

    pub fn currencies(&self) -> Vec<Currency> {
        let mut result = self.adapters.keys().copied().collect::<Vec<_>>();
        result.sort();
        result
    }
}
