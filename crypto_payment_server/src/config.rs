use std::{env, time::Duration};

use cpg_common::{parse_boolean_flag, Secret};
use crypto_payment_engine::{MerchantConfig, DEFAULT_SWEEP_CONCURRENCY, DEFAULT_SWEEP_INTERVAL};
use explorer_tools::ExplorerConfig;
use log::*;

const DEFAULT_CPG_HOST: &str = "127.0.0.1";
const DEFAULT_CPG_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/crypto_payments.db";
/// Header carrying the storefront's signature of the request body
pub const STOREFRONT_HMAC_HEADER: &str = "X-Cpg-Hmac-Sha256";
/// Header carrying the id of the customer on whose behalf the storefront is calling
pub const CUSTOMER_ID_HEADER: &str = "X-Cpg-Customer-Id";
/// Header carrying the storefront's signature of the customer id
pub const CUSTOMER_HMAC_HEADER: &str = "X-Cpg-Customer-Hmac";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub storefront: StorefrontConfig,
    /// Minimum time between two sweeps of the pending orders
    pub sweep_interval: Duration,
    /// Maximum number of orders reconciled at the same time during a sweep
    pub sweep_concurrency: usize,
    pub explorer: ExplorerConfig,
    pub merchant: MerchantConfig,
}

/// Shared secret between the storefront and the gateway.
#[derive(Clone, Debug, Default)]
pub struct StorefrontConfig {
    pub hmac_secret: Secret<String>,
    /// If false, storefront signatures are not checked. **DANGER**
    pub hmac_checks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CPG_HOST.to_string(),
            port: DEFAULT_CPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            storefront: StorefrontConfig::default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            sweep_concurrency: DEFAULT_SWEEP_CONCURRENCY,
            explorer: ExplorerConfig::default(),
            merchant: MerchantConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CPG_HOST").ok().unwrap_or_else(|| DEFAULT_CPG_HOST.into());
        let port = env::var("CPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CPG_PORT. {e} Using the default, {DEFAULT_CPG_PORT}, instead."
                    );
                    DEFAULT_CPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CPG_PORT);
        let database_url = env::var("CPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CPG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let sweep_interval = env::var("CPG_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for CPG_SWEEP_INTERVAL_SECS. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SWEEP_INTERVAL);
        let sweep_concurrency = env::var("CPG_SWEEP_CONCURRENCY")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for CPG_SWEEP_CONCURRENCY. {e}"))
                    .ok()
            })
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_SWEEP_CONCURRENCY);
        let storefront = StorefrontConfig::from_env_or_defaults();
        let explorer = ExplorerConfig::new_from_env_or_default();
        let merchant = MerchantConfig::new_from_env_or_default();
        Self { host, port, database_url, storefront, sweep_interval, sweep_concurrency, explorer, merchant }
    }
}

impl StorefrontConfig {
    pub fn new(secret: &str, hmac_checks: bool) -> Self {
        Self { hmac_secret: Secret::new(secret.to_string()), hmac_checks }
    }

    pub fn from_env_or_defaults() -> Self {
        let hmac_secret = env::var("CPG_STOREFRONT_HMAC_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ CPG_STOREFRONT_HMAC_SECRET is not set. Please set it to the secret your storefront signs requests \
                 with."
            );
            String::default()
        });
        let hmac_checks = parse_boolean_flag(env::var("CPG_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!("🚨️ Storefront HMAC checks are DISABLED. Anyone can place orders and check on any order.");
        }
        Self { hmac_secret: Secret::new(hmac_secret), hmac_checks }
    }
}
