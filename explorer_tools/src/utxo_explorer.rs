use cpg_common::CryptoAmount;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{ExplorerApiError, NormalizedTransaction};

/// Response body of a UTXO-chain explorer address query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoExplorerResponse {
    pub txs: Vec<UtxoTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoTransaction {
    pub txid: String,
    #[serde(default)]
    pub vout: Vec<UtxoOutput>,
    #[serde(default)]
    pub status: UtxoStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoOutput {
    /// Output value in the chain's smallest unit (satoshis)
    pub value: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UtxoStatus {
    #[serde(default)]
    pub confirmed: bool,
    pub block_height: Option<u64>,
}

/// Flatten a UTXO explorer response into one normalized transaction per valued output.
///
/// The explorer only reports a `confirmed` flag, so confirmation depth is 1 for confirmed transactions and 0 otherwise.
pub fn parse_utxo_response(
    response: UtxoExplorerResponse,
    decimals: u32,
) -> Result<Vec<NormalizedTransaction>, ExplorerApiError> {
    let mut result = Vec::new();
    for tx in response.txs {
        let confirmations = u64::from(tx.status.confirmed);
        for output in tx.vout.iter() {
            let Some(value) = output.value else {
                trace!("🔗️ Skipping output without a value in {}", tx.txid);
                continue;
            };
            let amount = CryptoAmount::from_base_units(u128::from(value), decimals)
                .map_err(|e| ExplorerApiError::InvalidResponse(format!("{} output value: {e}", tx.txid)))?;
            result.push(NormalizedTransaction {
                tx_hash: tx.txid.clone(),
                amount,
                is_confirmed: tx.status.confirmed,
                confirmations,
                is_error: false,
            });
        }
    }
    Ok(result)
}
