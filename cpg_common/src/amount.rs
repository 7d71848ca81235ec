use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Amounts are displayed and quoted to this many decimal places.
pub const DISPLAY_DECIMALS: u32 = 8;

//--------------------------------------     CryptoAmount      ---------------------------------------------------------
/// A non-negative amount of cryptocurrency, in whole-coin units (e.g. BTC, not satoshis).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CryptoAmount(Decimal);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoAmountError {
    #[error("Amount cannot be negative: {0}")]
    Negative(String),
    #[error("Amount is not a valid number: {0}")]
    InvalidNumber(String),
    #[error("Amount {0} cannot be represented with {1} decimal places")]
    OutOfRange(String, u32),
}

impl CryptoAmount {
    pub const ZERO: CryptoAmount = CryptoAmount(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, CryptoAmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(CryptoAmountError::Negative(value.to_string()));
        }
        Ok(Self(value.normalize()))
    }

    /// Convert an integer amount in the chain's smallest unit (satoshi, wei, ...) to whole coins.
    pub fn from_base_units(units: u128, decimals: u32) -> Result<Self, CryptoAmountError> {
        let units = i128::try_from(units).map_err(|_| CryptoAmountError::OutOfRange(units.to_string(), decimals))?;
        Decimal::try_from_i128_with_scale(units, decimals)
            .map(|d| Self(d.normalize()))
            .map_err(|_| CryptoAmountError::OutOfRange(units.to_string(), decimals))
    }

    /// As [`Self::from_base_units`], but for the decimal strings account-based explorers return.
    pub fn parse_base_units(units: &str, decimals: u32) -> Result<Self, CryptoAmountError> {
        let units = units.trim().parse::<u128>().map_err(|_| CryptoAmountError::InvalidNumber(units.to_string()))?;
        Self::from_base_units(units, decimals)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Fixed-point representation with exactly `dp` decimal places
    pub fn to_fixed(&self, dp: u32) -> String {
        let rounded = self.0.round_dp(dp);
        format!("{rounded:.prec$}", prec = dp as usize)
    }

    /// The amount as shown to payers and embedded in payment URIs
    pub fn to_display(&self) -> String {
        self.to_fixed(DISPLAY_DECIMALS)
    }
}

impl FromStr for CryptoAmount {
    type Err = CryptoAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim()))
            .map_err(|_| CryptoAmountError::InvalidNumber(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<Decimal> for CryptoAmount {
    type Error = CryptoAmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Display for CryptoAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn base_unit_conversion() {
        let sats = CryptoAmount::from_base_units(4_950_000, 8).unwrap();
        assert_eq!(sats.value(), dec!(0.0495));
        let usdt = CryptoAmount::parse_base_units("99000000", 6).unwrap();
        assert_eq!(usdt.value(), dec!(99));
        let wei = CryptoAmount::parse_base_units("1500000000000000000", 18).unwrap();
        assert_eq!(wei.value(), dec!(1.5));
        assert!(CryptoAmount::parse_base_units("12abc", 18).is_err());
        assert!(CryptoAmount::parse_base_units("-5", 18).is_err());
    }

    #[test]
    fn display_precision() {
        let amount: CryptoAmount = "0.0495".parse().unwrap();
        assert_eq!(amount.to_display(), "0.04950000");
        assert_eq!(amount.to_fixed(2), "0.05");
        let tiny: CryptoAmount = "1.23456789123".parse().unwrap();
        assert_eq!(tiny.to_display(), "1.23456789");
        assert_eq!(format!("{amount}"), "0.0495");
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert_eq!(
            CryptoAmount::new(dec!(-0.1)).unwrap_err(),
            CryptoAmountError::Negative("-0.1".to_string())
        );
        assert!("1e-3".parse::<CryptoAmount>().is_ok());
    }
}
