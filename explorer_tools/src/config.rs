use std::{collections::HashMap, env, time::Duration};

use cpg_common::{Currency, Secret, ALL_CURRENCIES};
use log::*;

/// Explorer calls that take longer than this are abandoned and treated as "no observation".
pub const DEFAULT_EXPLORER_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_QUOTE_API_URL: &str = "https://api.coingecko.com/api/v3";
/// The Tether (USDT) ERC-20 contract on Ethereum mainnet
pub const USDT_CONTRACT_ADDRESS: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Endpoint templates per currency. `{address}` and `{apikey}` are substituted at request time.
    pub endpoints: HashMap<Currency, String>,
    pub etherscan_api_key: Secret<String>,
    /// Base URL of the price quote API
    pub quote_api_url: String,
    pub timeout: Duration,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        let endpoints = ALL_CURRENCIES.iter().map(|c| (*c, default_endpoint(*c))).collect();
        Self {
            endpoints,
            etherscan_api_key: Secret::default(),
            quote_api_url: DEFAULT_QUOTE_API_URL.to_string(),
            timeout: DEFAULT_EXPLORER_TIMEOUT,
        }
    }
}

pub fn default_endpoint(currency: Currency) -> String {
    match currency {
        Currency::Btc => "https://blockstream.info/api/address/{address}".to_string(),
        Currency::Ltc => "https://blockstream.info/litecoin/api/address/{address}".to_string(),
        // There is no blockstream instance for BCH. Point CPG_BCH_EXPLORER_URL at an explorer serving the same schema.
        Currency::Bch => "https://blockstream.info/api/address/{address}".to_string(),
        Currency::Eth => {
            "https://api.etherscan.io/api?module=account&action=txlist&address={address}&sort=desc&apikey={apikey}"
                .to_string()
        },
        Currency::Usdt => format!(
            "https://api.etherscan.io/api?module=account&action=tokentx&contractaddress={USDT_CONTRACT_ADDRESS}&\
             address={{address}}&sort=desc&apikey={{apikey}}"
        ),
    }
}

impl ExplorerConfig {
    pub fn new_from_env_or_default() -> Self {
        let mut config = Self::default();
        for currency in ALL_CURRENCIES {
            let var = format!("CPG_{}_EXPLORER_URL", currency.code());
            if let Ok(url) = env::var(&var) {
                if url.contains("{address}") {
                    info!("🪛️ Using {url} as the {currency} explorer endpoint");
                    config.endpoints.insert(currency, url);
                } else {
                    warn!("🪛️ {var} must contain an {{address}} placeholder. Using the default endpoint instead.");
                }
            }
        }
        config.etherscan_api_key = Secret::new(env::var("CPG_ETHERSCAN_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ CPG_ETHERSCAN_API_KEY is not set. ETH and USDT explorer queries will be heavily rate limited.");
            String::default()
        }));
        if let Ok(url) = env::var("CPG_QUOTE_API_URL") {
            config.quote_api_url = url.trim_end_matches('/').to_string();
        }
        config.timeout = env::var("CPG_EXPLORER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for CPG_EXPLORER_TIMEOUT_SECS. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_EXPLORER_TIMEOUT);
        config
    }

    pub fn with_endpoint(mut self, currency: Currency, template: &str) -> Self {
        self.endpoints.insert(currency, template.to_string());
        self
    }

    pub fn with_quote_api_url(mut self, url: &str) -> Self {
        self.quote_api_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
