//! Matching observed transactions against the payment an order expects.
//!
//! The rules are deliberately simple:
//! * failed or reverted transactions are never eligible;
//! * an amount matches if it is within 2% of the expected amount, inclusive;
//! * the first eligible match in the explorer's order (most recent first) wins, even if a later one is closer;
//! * outputs are never summed.
//!
//! Two unrelated payments to the same address that both fall inside the tolerance band cannot be told apart. Once an
//! order is bound to a transaction hash, [`find_pinned_match`] keeps it bound to that transaction.
use cpg_common::CryptoAmount;
use explorer_tools::NormalizedTransaction;
use log::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Relative tolerance between the observed and expected amounts
pub const TOLERANCE: Decimal = dec!(0.02);
/// Confirmation depth at which a payment counts as confirmed
pub const MIN_CONFIRMATIONS: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub tx_hash: String,
    pub amount: CryptoAmount,
    pub confirmations: u64,
    pub confirmed: bool,
}

impl From<&NormalizedTransaction> for MatchResult {
    fn from(tx: &NormalizedTransaction) -> Self {
        Self {
            tx_hash: tx.tx_hash.clone(),
            amount: tx.amount,
            confirmations: tx.confirmations,
            confirmed: tx.confirmations >= MIN_CONFIRMATIONS,
        }
    }
}

pub fn within_tolerance(amount: CryptoAmount, expected: CryptoAmount) -> bool {
    let expected = expected.value();
    (amount.value() - expected).abs() <= expected * TOLERANCE
}

fn is_candidate(tx: &NormalizedTransaction, expected: CryptoAmount) -> bool {
    !tx.is_error && within_tolerance(tx.amount, expected)
}

/// The first eligible transaction within tolerance of `expected`, if any.
pub fn find_match(transactions: &[NormalizedTransaction], expected: CryptoAmount) -> Option<MatchResult> {
    let result = transactions.iter().find(|tx| is_candidate(tx, expected)).map(MatchResult::from);
    match &result {
        Some(m) => trace!("🧮️ {} of {} matches the expected {expected}", m.tx_hash, m.amount),
        None => trace!("🧮️ None of {} transactions match the expected {expected}", transactions.len()),
    }
    result
}

/// As [`find_match`], but only transactions with hash `tx_hash` are considered.
pub fn find_pinned_match(
    transactions: &[NormalizedTransaction],
    expected: CryptoAmount,
    tx_hash: &str,
) -> Option<MatchResult> {
    transactions
        .iter()
        .filter(|tx| tx.tx_hash.eq_ignore_ascii_case(tx_hash))
        .find(|tx| is_candidate(tx, expected))
        .map(MatchResult::from)
}
