use std::{str::FromStr, sync::Arc, time::Duration};

use cpg_common::Currency;
use log::*;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::{
    api::{build_client, get_json},
    ExplorerApiError,
};

/// Client for a CoinGecko-compatible `simple/price` endpoint.
#[derive(Clone, Debug)]
pub struct QuoteApi {
    base_url: String,
    client: Arc<Client>,
}

impl QuoteApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ExplorerApiError> {
        let client = build_client(timeout)?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), client: Arc::new(client) })
    }

    pub fn url(&self, currency: Currency) -> String {
        format!("{}/simple/price?ids={}&vs_currencies=usd", self.base_url, currency.quote_id())
    }

    /// The current price of one whole `currency` coin, in US dollars.
    pub async fn fetch_usd_price(&self, currency: Currency) -> Result<Decimal, ExplorerApiError> {
        let url = self.url(currency);
        trace!("💱️ Fetching {currency} price from {url}");
        let body = get_json::<Value>(&self.client, &url).await?;
        let price = parse_usd_price(&body, currency)?;
        debug!("💱️ 1 {currency} = ${price}");
        Ok(price)
    }
}

/// Extract `body[<quote id>]["usd"]` as an exact decimal. Missing, non-numeric or non-positive prices are errors.
pub fn parse_usd_price(body: &Value, currency: Currency) -> Result<Decimal, ExplorerApiError> {
    let id = currency.quote_id();
    let raw = body
        .get(id)
        .and_then(|v| v.get("usd"))
        .ok_or_else(|| ExplorerApiError::PriceUnavailable(format!("no USD price for {id} in the response")))?;
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return Err(ExplorerApiError::PriceUnavailable(format!("{id} price is not a number"))),
    };
    let price = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| ExplorerApiError::PriceUnavailable(format!("{id} price {text} is invalid. {e}")))?;
    if price <= Decimal::ZERO {
        return Err(ExplorerApiError::PriceUnavailable(format!("{id} price {price} is not positive")));
    }
    Ok(price)
}
