//! Interactive indicative price action
//!
//! One invocation per chat turn: extract swap parameters, resolve chain and
//! tokens, fetch a single price on the Permit2 route (no retry), persist the
//! inquiry and reply. User input problems get a specific reply; nothing
//! escapes the handler as an error.

use super::memory::PRICE_INQUIRY_TABLE;
use super::params::{
    compose_context, ParamsError, SwapParams, ValidatedSwapParams, SWAP_PARAMS_TEMPLATE,
};
use super::runtime::{AgentRuntime, Callback, Memory, Message, Response, State};
use super::Action;
use crate::amounts::{ensure_non_degenerate, to_base_units};
use crate::config::{Chain, ZeroExCredentials, ZERO_EX_API_KEY};
use crate::pricing::{format_amounts, render, PriceInquiry};
use crate::tokens::TokenMetadata;
use crate::tools::{PriceRequest, PriceRoute, PriceSource, ZeroExClient};
use crate::Result;
use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Action fetching a one-shot indicative price for a chat request
#[derive(Default)]
pub struct GetIndicativePriceAction {
    /// Fixed price source; built from runtime credentials when unset
    price_source: Option<Arc<dyn PriceSource>>,
}

impl GetIndicativePriceAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given price source instead of a 0x client built from settings
    pub fn with_price_source(price_source: Arc<dyn PriceSource>) -> Self {
        Self {
            price_source: Some(price_source),
        }
    }

    /// Price source for this turn plus the taker to quote for
    fn price_source(&self, runtime: &AgentRuntime) -> Result<(Arc<dyn PriceSource>, Option<Address>)> {
        let credentials =
            ZeroExCredentials::from_settings(runtime.settings.as_ref(), &runtime.config);
        match &self.price_source {
            Some(source) => Ok((
                Arc::clone(source),
                credentials.ok().and_then(|c| c.taker),
            )),
            None => {
                let credentials = credentials?;
                let client = ZeroExClient::from_credentials(&credentials);
                Ok((Arc::new(client), credentials.taker))
            }
        }
    }

    /// Resolve both tokens, or build the reply naming what is missing
    async fn resolve_tokens(
        runtime: &AgentRuntime,
        params: &ValidatedSwapParams,
        chain: Chain,
    ) -> std::result::Result<(TokenMetadata, TokenMetadata), String> {
        let chain_id = chain.chain_id();
        if !runtime.registry.is_chain_supported(chain_id) {
            return Err(format!(
                "Chain {} is not supported by the token registry.",
                chain
            ));
        }
        if let Err(e) = runtime.registry.initialize_chain(chain_id).await {
            warn!(error = %e, chain_id, "Token registry initialization failed");
            return Err(format!("Could not load tokens for chain {}: {}", chain, e));
        }

        let sell = runtime
            .registry
            .get_token_by_symbol(&params.sell_token_symbol, chain_id)
            .await;
        let buy = runtime
            .registry
            .get_token_by_symbol(&params.buy_token_symbol, chain_id)
            .await;

        match (sell, buy) {
            (Some(sell), Some(buy)) => Ok((sell, buy)),
            (sell, buy) => {
                let mut problems = Vec::new();
                if sell.is_none() {
                    problems.push(format!(
                        "Sell token '{}' not found on chain {}.",
                        params.sell_token_symbol, chain
                    ));
                }
                if buy.is_none() {
                    problems.push(format!(
                        "Buy token '{}' not found on chain {}.",
                        params.buy_token_symbol, chain
                    ));
                }
                Err(problems.join("\n"))
            }
        }
    }

    /// Run the pipeline for already-validated parameters
    ///
    /// Sends exactly one reply through `callback` and returns whether a price
    /// was delivered.
    pub async fn run(
        &self,
        runtime: &AgentRuntime,
        message: &Message,
        state: &State,
        params: ValidatedSwapParams,
        callback: &dyn Callback,
    ) -> bool {
        let Some(chain) = Chain::from_name(&params.chain) else {
            callback
                .send(Response::text(format!(
                    "Unsupported chain: {}. Supported chains are: {}",
                    params.chain,
                    Chain::supported_names()
                )))
                .await;
            return false;
        };
        let chain_id = chain.chain_id();

        let (sell_token, buy_token) = match Self::resolve_tokens(runtime, &params, chain).await {
            Ok(tokens) => tokens,
            Err(reply) => {
                callback.send(Response::text(reply)).await;
                return false;
            }
        };

        let sell_amount = match to_base_units(&params.sell_amount, sell_token.decimals)
            .and_then(ensure_non_degenerate)
        {
            Ok(amount) => amount,
            Err(e) => {
                callback
                    .send(Response::text(format!(
                        "Invalid sell amount {} {}: {}",
                        params.sell_amount, sell_token.symbol, e
                    )))
                    .await;
                return false;
            }
        };

        let outcome = async {
            let (source, taker) = self.price_source(runtime)?;
            let request = PriceRequest::new(sell_token.address, buy_token.address, sell_amount, chain_id)
                .with_taker(taker);
            let price = source.price(&request, PriceRoute::Permit2).await?;
            format_amounts(&price, &buy_token, &sell_token).ok_or(crate::Error::NoLiquidity)
        }
        .await;

        let amounts = match outcome {
            Ok(amounts) => amounts,
            Err(e) => {
                error!(
                    error = %e,
                    chain_id,
                    sell = %sell_token.symbol,
                    buy = %buy_token.symbol,
                    sell_amount = %sell_amount,
                    "Failed to get indicative price"
                );
                callback
                    .send(Response::with_content(
                        format!("Error getting price: {}", e),
                        json!({ "error": e.to_string() }),
                    ))
                    .await;
                return false;
            }
        };

        let inquiry = PriceInquiry::new(sell_token, buy_token, sell_amount, chain_id);
        let text = render(&amounts, chain.name(), true);
        let content = json!({ "priceInquiry": inquiry });

        let memory = Memory::new(
            message.room_id,
            message.user_id,
            runtime.agent_id,
            json!({ "text": text, "priceInquiry": inquiry }),
        );
        if let Err(e) = runtime.memory.create_memory(memory, PRICE_INQUIRY_TABLE).await {
            warn!(error = %e, "Failed to persist price inquiry");
        }

        let response = Response::with_content(text, content);
        callback.send(response.clone()).await;
        runtime.trace.trace_result(state, &response);

        info!(
            chain_id,
            sell = %inquiry.sell_token_object.symbol,
            buy = %inquiry.buy_token_object.symbol,
            rate = amounts.rate,
            "Delivered indicative price"
        );
        true
    }
}

#[async_trait]
impl Action for GetIndicativePriceAction {
    fn name(&self) -> &'static str {
        "GET_INDICATIVE_PRICE"
    }

    fn similes(&self) -> &'static [&'static str] {
        &["GET_PRICE", "TOKEN_PRICE", "CHECK_PRICE", "PRICE_CHECK", "SWAP_PRICE"]
    }

    fn description(&self) -> &'static str {
        "Get an indicative (non-binding) price for swapping one token for another \
         through the 0x API"
    }

    async fn validate(&self, runtime: &AgentRuntime, _message: &Message) -> bool {
        runtime.get_setting(ZERO_EX_API_KEY).is_some()
    }

    async fn handler(
        &self,
        runtime: &AgentRuntime,
        message: &Message,
        state: &State,
        callback: &dyn Callback,
    ) -> bool {
        if !self.validate(runtime, message).await {
            info!(action = self.name(), "Skipping action, {} is not set", ZERO_EX_API_KEY);
            return false;
        }

        let context = compose_context(SWAP_PARAMS_TEMPLATE, &state.recent_messages_text());
        let extracted = match runtime
            .extractor
            .generate(&context, &SwapParams::schema())
            .await
        {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "Swap parameter extraction failed");
                callback
                    .send(Response::text(format!("Error getting price: {}", e)))
                    .await;
                return false;
            }
        };

        let params = match SwapParams::from_extracted(&extracted).and_then(|p| p.validate()) {
            Ok(params) => params,
            Err(ParamsError::Missing(missing)) => {
                callback
                    .send(Response::text(format!(
                        "I need more information to get a price. Please provide: {}.",
                        missing.join(", ")
                    )))
                    .await;
                return false;
            }
            Err(ParamsError::InvalidAmount(raw)) => {
                callback
                    .send(Response::text(format!(
                        "Invalid sell amount {}: the amount cannot be represented exactly.",
                        raw
                    )))
                    .await;
                return false;
            }
        };

        self.run(runtime, message, state, params, callback).await
    }
}
