mod amount;
mod currency;
mod helpers;
mod secret;

pub use amount::{CryptoAmount, CryptoAmountError};
pub use currency::{ChainFamily, Currency, CurrencyParseError, ALL_CURRENCIES};
pub use helpers::{parse_boolean_flag, parse_list};
pub use secret::Secret;
