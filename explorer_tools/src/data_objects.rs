use cpg_common::CryptoAmount;
use serde::{Deserialize, Serialize};

/// A chain-agnostic view of one incoming transfer to an address.
///
/// UTXO explorers produce one of these per valued output, so a single on-chain transaction can appear several times
/// with the same `tx_hash`. The list order is the explorer's order (most recent first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTransaction {
    pub tx_hash: String,
    /// Already converted to whole-coin units
    pub amount: CryptoAmount,
    /// The explorer reports the transaction as settled in a block
    pub is_confirmed: bool,
    pub confirmations: u64,
    /// The explorer reports the transaction as failed or reverted
    pub is_error: bool,
}

impl NormalizedTransaction {
    pub fn new(tx_hash: impl Into<String>, amount: CryptoAmount, confirmations: u64) -> Self {
        Self { tx_hash: tx_hash.into(), amount, is_confirmed: confirmations > 0, confirmations, is_error: false }
    }

    pub fn failed(mut self) -> Self {
        self.is_error = true;
        self
    }
}
