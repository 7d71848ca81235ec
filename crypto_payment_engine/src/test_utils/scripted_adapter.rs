use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use async_trait::async_trait;
use cpg_common::{CryptoAmount, Currency};
use explorer_tools::NormalizedTransaction;

use crate::traits::{ChainAdapter, ChainAdapterError};

type Response = Result<Vec<NormalizedTransaction>, ChainAdapterError>;

/// A chain adapter that replays canned explorer responses in order. Once the script runs out, the last response is
/// repeated (or an empty list, if nothing was ever scripted).
#[derive(Clone)]
pub struct ScriptedChainAdapter {
    currency: Currency,
    script: Arc<Mutex<VecDeque<Response>>>,
    last: Arc<Mutex<Option<Response>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedChainAdapter {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            script: Arc::new(Mutex::new(VecDeque::new())),
            last: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn then_return(&self, transactions: Vec<NormalizedTransaction>) -> &Self {
        self.script.lock().unwrap().push_back(Ok(transactions));
        self
    }

    pub fn then_fail(&self, error: ChainAdapterError) -> &Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Number of times the adapter has been queried
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainAdapter for ScriptedChainAdapter {
    fn currency(&self) -> Currency {
        self.currency
    }

    async fn fetch_transactions(&self, _address: &str) -> Result<Vec<NormalizedTransaction>, ChainAdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(response) => {
                *last = Some(response.clone());
                response
            },
            None => last.clone().unwrap_or_else(|| Ok(Vec::new())),
        }
    }
}

/// Shorthand for a normalized transaction with the given whole-coin amount
pub fn tx(hash: &str, amount: &str, confirmations: u64) -> NormalizedTransaction {
    let amount = amount.parse::<CryptoAmount>().expect("invalid test amount");
    NormalizedTransaction::new(hash, amount, confirmations)
}
