use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------      Currency       ---------------------------------------------------------
/// The cryptocurrencies the gateway accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    /// Bitcoin
    Btc,
    /// Ether, the native Ethereum asset
    Eth,
    /// Tether, the ERC-20 token on Ethereum
    Usdt,
    /// Bitcoin Cash
    Bch,
    /// Litecoin
    Ltc,
}

pub const ALL_CURRENCIES: [Currency; 5] = [Currency::Btc, Currency::Eth, Currency::Usdt, Currency::Bch, Currency::Ltc];

/// How an explorer reports transactions for a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFamily {
    /// Transactions with a list of outputs, each carrying a value in the smallest unit
    Utxo,
    /// A flat list of account transfers, as reported by Etherscan-style explorers
    Account,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported cryptocurrency: {0}")]
pub struct CurrencyParseError(pub String);

impl Currency {
    /// The upper-case ticker. This is the value stored against orders.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Btc => "BTC",
            Currency::Eth => "ETH",
            Currency::Usdt => "USDT",
            Currency::Bch => "BCH",
            Currency::Ltc => "LTC",
        }
    }

    /// The identifier used by the price quote API
    pub fn quote_id(&self) -> &'static str {
        match self {
            Currency::Btc => "bitcoin",
            Currency::Eth => "ethereum",
            Currency::Usdt => "tether",
            Currency::Bch => "bitcoin-cash",
            Currency::Ltc => "litecoin",
        }
    }

    /// The scheme used when building a payment URI for wallets and QR codes
    pub fn uri_scheme(&self) -> &'static str {
        match self {
            Currency::Btc => "bitcoin",
            Currency::Eth => "ethereum",
            Currency::Usdt => "tether",
            Currency::Bch => "bitcoincash",
            Currency::Ltc => "litecoin",
        }
    }

    /// Number of decimal places between the chain's smallest unit and one whole coin.
    pub fn decimals(&self) -> u32 {
        match self {
            Currency::Btc | Currency::Bch | Currency::Ltc => 8,
            Currency::Eth => 18,
            Currency::Usdt => 6,
        }
    }

    pub fn family(&self) -> ChainFamily {
        match self {
            Currency::Btc | Currency::Bch | Currency::Ltc => ChainFamily::Utxo,
            Currency::Eth | Currency::Usdt => ChainFamily::Account,
        }
    }

    /// A human-readable label, e.g. "Bitcoin (BTC)"
    pub fn label(&self) -> &'static str {
        match self {
            Currency::Btc => "Bitcoin (BTC)",
            Currency::Eth => "Ethereum (ETH)",
            Currency::Usdt => "Tether (USDT)",
            Currency::Bch => "Bitcoin Cash (BCH)",
            Currency::Ltc => "Litecoin (LTC)",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CurrencyParseError;

    /// Accepts either the ticker or the quote API id, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ALL_CURRENCIES
            .iter()
            .find(|c| c.code().eq_ignore_ascii_case(&needle) || c.quote_id() == needle || c.uri_scheme() == needle)
            .copied()
            .ok_or_else(|| CurrencyParseError(s.to_string()))
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code().to_string()
    }
}
