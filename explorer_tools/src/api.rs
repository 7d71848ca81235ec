use std::{sync::Arc, time::Duration};

use cpg_common::{ChainFamily, Currency};
use log::*;
use reqwest::{header::HeaderValue, Client};
use serde::de::DeserializeOwned;

use crate::{
    account_explorer::{parse_account_response, AccountExplorerResponse},
    config::ExplorerConfig,
    helpers::render_endpoint,
    utxo_explorer::{parse_utxo_response, UtxoExplorerResponse},
    ExplorerApiError,
    NormalizedTransaction,
};

/// Read-only client for the block explorers configured in [`ExplorerConfig`].
///
/// There are no retries. A failed query simply means that nothing was observed this time around.
#[derive(Clone, Debug)]
pub struct ExplorerApi {
    config: ExplorerConfig,
    client: Arc<Client>,
}

pub(crate) fn build_client(timeout: Duration) -> Result<Client, ExplorerApiError> {
    let mut headers = reqwest::header::HeaderMap::with_capacity(1);
    headers.insert("Accept", HeaderValue::from_static("application/json"));
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .user_agent(concat!("crypto-payment-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ExplorerApiError::Initialization(e.to_string()))
}

/// Issue a GET request and deserialize a successful JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, ExplorerApiError> {
    let response = client.get(url).send().await?;
    if response.status().is_success() {
        trace!("🔗️ Query successful. {}", response.status());
        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| ExplorerApiError::JsonError(e.to_string()))
    } else {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Err(ExplorerApiError::QueryError { status, message })
    }
}

impl ExplorerApi {
    pub fn new(config: ExplorerConfig) -> Result<Self, ExplorerApiError> {
        let client = build_client(config.timeout)?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// The fully rendered explorer URL for `address`. The result may contain an API key, so don't log it.
    pub fn endpoint(&self, currency: Currency, address: &str) -> Result<String, ExplorerApiError> {
        let template = self.config.endpoints.get(&currency).ok_or(ExplorerApiError::MissingEndpoint(currency))?;
        Ok(render_endpoint(template, address, &self.config.etherscan_api_key))
    }

    /// Fetch the recent transactions for `address` on `currency`'s chain, most recent first.
    pub async fn fetch_transactions(
        &self,
        currency: Currency,
        address: &str,
    ) -> Result<Vec<NormalizedTransaction>, ExplorerApiError> {
        let url = self.endpoint(currency, address)?;
        debug!("🔗️ Querying the {currency} explorer for {address}");
        let transactions = match currency.family() {
            ChainFamily::Utxo => {
                let response = get_json::<UtxoExplorerResponse>(&self.client, &url).await?;
                parse_utxo_response(response, currency.decimals())?
            },
            ChainFamily::Account => {
                let response = get_json::<AccountExplorerResponse>(&self.client, &url).await?;
                parse_account_response(response, currency.decimals())?
            },
        };
        debug!("🔗️ {} {currency} transactions reported for {address}", transactions.len());
        Ok(transactions)
    }
}
