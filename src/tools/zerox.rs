//! 0x swap API price client
//!
//! Wraps the 0x v2 indicative price endpoints. Two routes are exposed and
//! the caller picks one:
//! - `Permit2`: the default swap-route query (`/swap/permit2/price`)
//! - `AllowanceHolder`: the gas-abstracted route (`/swap/allowance-holder/price`)
//!
//! [`ZeroExClient`] surfaces every failure as an [`Error`]; [`QuoteAdapter`]
//! sits on top and turns those failures into `None` plus a log line, for
//! callers that treat upstream errors as transient.

use crate::config::{with_trailing_slash, ChainId, ZeroExCredentials};
use crate::{Error, Result};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// 0x API version header value
const API_VERSION: &str = "v2";

/// Which 0x price endpoint to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceRoute {
    #[default]
    Permit2,
    AllowanceHolder,
}

impl PriceRoute {
    /// Endpoint path relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            PriceRoute::Permit2 => "swap/permit2/price",
            PriceRoute::AllowanceHolder => "swap/allowance-holder/price",
        }
    }
}

/// Indicative price request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRequest {
    pub sell_token: Address,
    pub buy_token: Address,
    /// Sell amount in base units
    pub sell_amount: U256,
    pub chain_id: ChainId,
    pub taker: Option<Address>,
}

impl PriceRequest {
    pub fn new(sell_token: Address, buy_token: Address, sell_amount: U256, chain_id: ChainId) -> Self {
        Self {
            sell_token,
            buy_token,
            sell_amount,
            chain_id,
            taker: None,
        }
    }

    pub fn with_taker(mut self, taker: Option<Address>) -> Self {
        self.taker = taker;
        self
    }

    /// Query string parameters in wire format
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("chainId", self.chain_id.to_string()),
            ("sellToken", self.sell_token.to_string()),
            ("buyToken", self.buy_token.to_string()),
            ("sellAmount", self.sell_amount.to_string()),
        ];
        if let Some(taker) = self.taker {
            params.push(("taker", taker.to_string()));
        }
        params
    }
}

/// Body of a 0x `/price` response
///
/// Only the amounts are interpreted; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity_available: Option<bool>,
    /// Sell amount in base units (decimal integer string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_amount: Option<String>,
    /// Buy amount in base units (decimal integer string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_amount: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PriceResponse {
    /// Build a response carrying just the two amounts
    pub fn from_amounts(sell_amount: impl Into<String>, buy_amount: impl Into<String>) -> Self {
        Self {
            liquidity_available: Some(true),
            sell_amount: Some(sell_amount.into()),
            buy_amount: Some(buy_amount.into()),
            extra: Map::new(),
        }
    }

    pub fn sell_amount_units(&self) -> Option<U256> {
        self.sell_amount.as_deref().and_then(|s| U256::from_str(s).ok())
    }

    pub fn buy_amount_units(&self) -> Option<U256> {
        self.buy_amount.as_deref().and_then(|s| U256::from_str(s).ok())
    }

    /// Whether the response carries a usable quote
    pub fn has_quote(&self) -> bool {
        self.liquidity_available != Some(false)
            && self.sell_amount_units().is_some()
            && self.buy_amount_units().is_some()
    }
}

/// Source of indicative prices
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn price(&self, request: &PriceRequest, route: PriceRoute) -> Result<PriceResponse>;
}

/// HTTP client for the 0x swap API
pub struct ZeroExClient {
    client: Client,
    api_url: Url,
    api_key: SecretString,
}

impl ZeroExClient {
    /// Create a client; endpoint paths are resolved under `api_url`'s path
    pub fn new(api_url: Url, api_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            api_url: with_trailing_slash(api_url),
            api_key,
        }
    }

    pub fn from_credentials(credentials: &ZeroExCredentials) -> Self {
        Self::new(credentials.api_url.clone(), credentials.api_key.clone())
    }

    fn endpoint(&self, route: PriceRoute) -> Result<Url> {
        self.api_url
            .join(route.path())
            .map_err(|e| Error::Config(format!("Invalid 0x endpoint: {}", e)))
    }
}

#[async_trait]
impl PriceSource for ZeroExClient {
    async fn price(&self, request: &PriceRequest, route: PriceRoute) -> Result<PriceResponse> {
        let endpoint = self.endpoint(route)?;

        tracing::debug!(
            endpoint = %endpoint,
            chain_id = request.chain_id,
            sell_token = %request.sell_token,
            buy_token = %request.buy_token,
            sell_amount = %request.sell_amount,
            "Requesting 0x price"
        );

        let response = self
            .client
            .get(endpoint)
            .header("0x-api-key", self.api_key.expose_secret())
            .header("0x-version", API_VERSION)
            .query(&request.query_params())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or(body);
            return Err(Error::ZeroEx {
                status: status.as_u16(),
                message,
            });
        }

        let price: PriceResponse = response.json().await?;
        if !price.has_quote() {
            return Err(Error::NoLiquidity);
        }
        Ok(price)
    }
}

/// Null-normalizing wrapper around a [`PriceSource`]
#[derive(Clone)]
pub struct QuoteAdapter {
    source: Arc<dyn PriceSource>,
}

impl QuoteAdapter {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }

    /// Fetch a price, converting any failure into `None`
    pub async fn fetch_price(&self, request: &PriceRequest, route: PriceRoute) -> Option<PriceResponse> {
        match self.source.price(request, route).await {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    route = ?route,
                    chain_id = request.chain_id,
                    sell_token = %request.sell_token,
                    buy_token = %request.buy_token,
                    sell_amount = %request.sell_amount,
                    "0x price fetch failed"
                );
                None
            }
        }
    }
}
