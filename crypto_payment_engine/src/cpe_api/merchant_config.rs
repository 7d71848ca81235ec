use std::{collections::HashMap, env};

use cpg_common::{parse_list, Currency, ALL_CURRENCIES};
use log::*;

use crate::cpe_api::errors::CheckoutError;

/// Which currencies the merchant accepts, and where each one should be paid.
#[derive(Debug, Clone)]
pub struct MerchantConfig {
    pub enabled_currencies: Vec<Currency>,
    pub wallets: HashMap<Currency, String>,
}

impl Default for MerchantConfig {
    fn default() -> Self {
        Self { enabled_currencies: ALL_CURRENCIES.to_vec(), wallets: HashMap::new() }
    }
}

impl MerchantConfig {
    pub fn new_from_env_or_default() -> Self {
        let mut config = Self::default();
        if let Ok(list) = env::var("CPG_ENABLED_CURRENCIES") {
            let mut enabled = Vec::new();
            for code in parse_list(&list) {
                match code.parse::<Currency>() {
                    Ok(c) if !enabled.contains(&c) => enabled.push(c),
                    Ok(_) => {},
                    Err(e) => warn!("🪛️ Ignoring CPG_ENABLED_CURRENCIES entry. {e}"),
                }
            }
            config.enabled_currencies = enabled;
        }
        for currency in ALL_CURRENCIES {
            let var = format!("CPG_{}_ADDRESS", currency.code());
            match env::var(&var).map(|s| s.trim().to_string()) {
                Ok(address) if !address.is_empty() => {
                    config.wallets.insert(currency, address);
                },
                _ if config.enabled_currencies.contains(&currency) => {
                    warn!("🪛️ {currency} is enabled, but {var} is not set. Customers won't be able to pay in {currency}.");
                },
                _ => {},
            }
        }
        info!("🪛️ Accepting payment in {:?}", config.payable_currencies());
        config
    }

    pub fn with_wallet(mut self, currency: Currency, address: &str) -> Self {
        self.wallets.insert(currency, address.to_string());
        self
    }

    pub fn with_enabled_currencies(mut self, currencies: &[Currency]) -> Self {
        self.enabled_currencies = currencies.to_vec();
        self
    }

    pub fn is_enabled(&self, currency: Currency) -> bool {
        self.enabled_currencies.contains(&currency)
    }

    /// The wallet that should receive payment in `currency`.
    pub fn wallet_for(&self, currency: Currency) -> Result<&str, CheckoutError> {
        if !self.is_enabled(currency) {
            return Err(CheckoutError::configuration(currency.code(), "this currency is not accepted"));
        }
        self.wallets
            .get(&currency)
            .map(String::as_str)
            .ok_or_else(|| CheckoutError::configuration(currency.code(), "no wallet address is configured"))
    }

    /// Enabled currencies that also have a wallet
    pub fn payable_currencies(&self) -> Vec<Currency> {
        self.enabled_currencies.iter().copied().filter(|c| self.wallets.contains_key(c)).collect()
    }
}
