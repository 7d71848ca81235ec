use cpg_common::CryptoAmount;
use serde::{Deserialize, Serialize};

use crate::{ExplorerApiError, NormalizedTransaction};

/// Response body of an Etherscan-style account transaction list (native transfers or token transfers)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountExplorerResponse {
    pub result: Vec<AccountTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTransaction {
    pub hash: String,
    /// Integer amount in the smallest unit, as a decimal string
    pub value: String,
    #[serde(rename = "isError", default)]
    pub is_error: Option<String>,
    #[serde(default)]
    pub txreceipt_status: Option<String>,
    #[serde(default)]
    pub confirmations: Option<String>,
}

impl AccountTransaction {
    /// Errored or reverted transfers. Token transfer lists omit the receipt status, which is not a failure.
    pub fn failed(&self) -> bool {
        let flagged = self.is_error.as_deref().map(str::trim) == Some("1");
        let reverted = self.txreceipt_status.as_deref().map(str::trim) == Some("0");
        flagged || reverted
    }

    pub fn confirmations(&self) -> u64 {
        self.confirmations.as_deref().and_then(|s| s.trim().parse::<i64>().ok()).map(|c| c.max(0) as u64).unwrap_or(0)
    }
}

/// Convert an account transaction list into normalized transactions, dividing values by `10^decimals`.
///
/// Failed transfers are kept, but flagged, so that the caller decides what to do with them.
pub fn parse_account_response(
    response: AccountExplorerResponse,
    decimals: u32,
) -> Result<Vec<NormalizedTransaction>, ExplorerApiError> {
    response
        .result
        .into_iter()
        .map(|tx| {
            let amount = CryptoAmount::parse_base_units(&tx.value, decimals)
                .map_err(|e| ExplorerApiError::InvalidResponse(format!("{} value: {e}", tx.hash)))?;
            let confirmations = tx.confirmations();
            let is_error = tx.failed();
            Ok(NormalizedTransaction { tx_hash: tx.hash, amount, is_confirmed: confirmations > 0, confirmations, is_error })
        })
        .collect()
}
