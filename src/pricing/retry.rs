//! Retrying price lookup
//!
//! Drives `Resolving -> Normalizing -> Fetching -> Succeeded | Failed`.
//! Every stage returns a [`StageOutcome`]; the controller branches on the
//! failure kind:
//! - terminal (unsupported chain, unknown symbol, degenerate amount): stop
//!   immediately, no retry
//! - transient (the quote adapter returned nothing): wait `policy.delay`,
//!   then start a new attempt, up to `policy.max_attempts`

use super::PriceInquiry;
use crate::amounts::{ensure_non_degenerate, to_base_units};
use crate::config::{ChainId, RetryConfig};
use crate::tokens::{TokenMetadata, TokenRegistry};
use crate::tools::{PriceRequest, PriceResponse, PriceRoute, QuoteAdapter};
use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bounded retry with a fixed delay between failed fetches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            delay: Duration::from_secs(5),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: config.delay(),
        }
    }
}

/// Arguments of a standalone price lookup
#[derive(Debug, Clone, PartialEq)]
pub struct PriceInquiryRequest {
    pub sell_symbol: String,
    /// Human-readable sell amount
    pub sell_amount: Decimal,
    pub buy_symbol: String,
    pub chain_id: ChainId,
    pub taker: Option<Address>,
}

impl PriceInquiryRequest {
    pub fn new(
        sell_symbol: impl Into<String>,
        sell_amount: Decimal,
        buy_symbol: impl Into<String>,
        chain_id: ChainId,
    ) -> Self {
        Self {
            sell_symbol: sell_symbol.into(),
            sell_amount,
            buy_symbol: buy_symbol.into(),
            chain_id,
            taker: None,
        }
    }
}

/// Why a stage did not proceed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageFailure {
    /// Retrying cannot help (bad input)
    Terminal(String),
    /// A later attempt may succeed (upstream flakiness)
    Transient(String),
}

/// Result of one pipeline stage
pub type StageOutcome<T> = std::result::Result<T, StageFailure>;

/// A successful lookup together with the price it was built from
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutput {
    pub inquiry: PriceInquiry,
    pub price: PriceResponse,
}

enum RetryState {
    Resolving,
    Normalizing {
        sell: TokenMetadata,
        buy: TokenMetadata,
    },
    Fetching {
        sell: TokenMetadata,
        buy: TokenMetadata,
        amount: U256,
    },
    Succeeded(RetryOutput),
    Failed,
}

/// Retrying price lookup over the allowance-holder route
pub struct RetryController<'a> {
    registry: &'a TokenRegistry,
    quoter: &'a QuoteAdapter,
    policy: RetryPolicy,
}

impl<'a> RetryController<'a> {
    pub fn new(registry: &'a TokenRegistry, quoter: &'a QuoteAdapter, policy: RetryPolicy) -> Self {
        Self {
            registry,
            quoter,
            policy,
        }
    }

    /// Run the pipeline until it succeeds, fails terminally, or runs out of
    /// attempts
    pub async fn run(&self, request: &PriceInquiryRequest) -> Option<RetryOutput> {
        let mut attempt: u32 = 1;
        let mut state = RetryState::Resolving;

        loop {
            let next = match state {
                RetryState::Resolving => self
                    .resolve(request)
                    .await
                    .map(|(sell, buy)| RetryState::Normalizing { sell, buy }),
                RetryState::Normalizing { sell, buy } => self
                    .normalize(request, &sell)
                    .map(|amount| RetryState::Fetching { sell, buy, amount }),
                RetryState::Fetching { sell, buy, amount } => {
                    let price = self.fetch(request, &sell, &buy, amount).await;
                    price.map(|price| {
                        RetryState::Succeeded(RetryOutput {
                            inquiry: PriceInquiry::new(sell, buy, amount, request.chain_id),
                            price,
                        })
                    })
                }
                RetryState::Succeeded(output) => {
                    info!(
                        attempt,
                        chain_id = request.chain_id,
                        sell = %request.sell_symbol,
                        buy = %request.buy_symbol,
                        "Price inquiry succeeded"
                    );
                    return Some(output);
                }
                RetryState::Failed => return None,
            };

            state = match next {
                Ok(state) => state,
                Err(StageFailure::Terminal(reason)) => {
                    warn!(
                        attempt,
                        chain_id = request.chain_id,
                        sell = %request.sell_symbol,
                        buy = %request.buy_symbol,
                        sell_amount = %request.sell_amount,
                        reason = %reason,
                        "Price inquiry failed, not retrying"
                    );
                    RetryState::Failed
                }
                Err(StageFailure::Transient(reason)) if attempt < self.policy.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_secs = self.policy.delay.as_secs(),
                        chain_id = request.chain_id,
                        sell = %request.sell_symbol,
                        buy = %request.buy_symbol,
                        sell_amount = %request.sell_amount,
                        reason = %reason,
                        "Price fetch failed, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                    RetryState::Resolving
                }
                Err(StageFailure::Transient(reason)) => {
                    warn!(
                        attempt,
                        chain_id = request.chain_id,
                        sell = %request.sell_symbol,
                        buy = %request.buy_symbol,
                        sell_amount = %request.sell_amount,
                        reason = %reason,
                        "Price fetch failed, attempts exhausted"
                    );
                    RetryState::Failed
                }
            };
        }
    }

    async fn resolve(&self, request: &PriceInquiryRequest) -> StageOutcome<(TokenMetadata, TokenMetadata)> {
        let chain_id = request.chain_id;
        if !self.registry.is_chain_supported(chain_id) {
            return Err(StageFailure::Terminal(format!(
                "chain {} is not supported by the token registry",
                chain_id
            )));
        }
        self.registry
            .initialize_chain(chain_id)
            .await
            .map_err(|e| StageFailure::Terminal(e.to_string()))?;

        let sell = self
            .registry
            .get_token_by_symbol(&request.sell_symbol, chain_id)
            .await;
        let buy = self
            .registry
            .get_token_by_symbol(&request.buy_symbol, chain_id)
            .await;

        match (sell, buy) {
            (Some(sell), Some(buy)) => {
                debug!(
                    sell = %sell.address,
                    buy = %buy.address,
                    chain_id,
                    "Resolved tokens"
                );
                Ok((sell, buy))
            }
            (sell, buy) => {
                let mut missing = Vec::new();
                if sell.is_none() {
                    missing.push(request.sell_symbol.as_str());
                }
                if buy.is_none() {
                    missing.push(request.buy_symbol.as_str());
                }
                Err(StageFailure::Terminal(format!(
                    "unknown token(s) on chain {}: {}",
                    chain_id,
                    missing.join(", ")
                )))
            }
        }
    }

    fn normalize(&self, request: &PriceInquiryRequest, sell: &TokenMetadata) -> StageOutcome<U256> {
        to_base_units(&request.sell_amount, sell.decimals)
            .and_then(ensure_non_degenerate)
            .map_err(|e| StageFailure::Terminal(e.to_string()))
    }

    async fn fetch(
        &self,
        request: &PriceInquiryRequest,
        sell: &TokenMetadata,
        buy: &TokenMetadata,
        amount: U256,
    ) -> StageOutcome<PriceResponse> {
        let price_request = PriceRequest::new(sell.address, buy.address, amount, request.chain_id)
            .with_taker(request.taker);
        self.quoter
            .fetch_price(&price_request, PriceRoute::AllowanceHolder)
            .await
            .ok_or_else(|| StageFailure::Transient("no quote available".to_string()))
    }
}

/// Standalone retrying price lookup
///
/// Always queries the allowance-holder route. Never errors: returns `None`
/// on bad input or once every attempt has failed.
pub async fn get_price_inquiry(
    registry: &TokenRegistry,
    quoter: &QuoteAdapter,
    policy: &RetryPolicy,
    request: &PriceInquiryRequest,
) -> Option<PriceInquiry> {
    RetryController::new(registry, quoter, policy.clone())
        .run(request)
        .await
        .map(|output| output.inquiry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::chains::ids;
    use crate::tools::PriceSource;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    /// Fails until the configured call number, then returns a fixed price
    struct FlakySource {
        succeed_on: Option<u32>,
        calls: AtomicU32,
        routes: Mutex<Vec<PriceRoute>>,
    }

    impl FlakySource {
        fn succeeding_on(call: u32) -> Arc<Self> {
            Arc::new(Self {
                succeed_on: Some(call),
                calls: AtomicU32::new(0),
                routes: Mutex::new(Vec::new()),
            })
        }

        fn always_failing() -> Arc<Self> {
            Arc::new(Self {
                succeed_on: None,
                calls: AtomicU32::new(0),
                routes: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceSource for FlakySource {
        async fn price(&self, request: &PriceRequest, route: PriceRoute) -> Result<PriceResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.routes.lock().unwrap().push(route);
            match self.succeed_on {
                Some(n) if call >= n => Ok(PriceResponse::from_amounts(
                    request.sell_amount.to_string(),
                    "4000000000",
                )),
                _ => Err(Error::ZeroEx {
                    status: 503,
                    message: "service unavailable".to_string(),
                }),
            }
        }
    }

    fn eth_to_usdc(amount: &str) -> PriceInquiryRequest {
        PriceInquiryRequest::new("ETH", Decimal::from_str(amount).unwrap(), "USDC", ids::OPTIMISM)
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_nth_attempt() {
        for n in 1..=6u32 {
            let source = FlakySource::succeeding_on(n);
            let registry = TokenRegistry::builtin();
            let quoter = QuoteAdapter::new(source.clone());

            let started = Instant::now();
            let inquiry = get_price_inquiry(
                &registry,
                &quoter,
                &RetryPolicy::default(),
                &eth_to_usdc("2"),
            )
            .await
            .expect("inquiry should succeed");

            assert_eq!(source.calls(), n);
            assert!(started.elapsed() >= Duration::from_secs(5) * (n - 1));
            assert_eq!(inquiry.sell_amount_base_units, "2000000000000000000");
            assert_eq!(inquiry.chain_id, ids::OPTIMISM);
            assert_eq!(inquiry.sell_token_object.symbol, "ETH");
            assert_eq!(inquiry.buy_token_object.symbol, "USDC");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_six_attempts() {
        let source = FlakySource::always_failing();
        let registry = TokenRegistry::builtin();
        let quoter = QuoteAdapter::new(source.clone());

        let started = Instant::now();
        let inquiry =
            get_price_inquiry(&registry, &quoter, &RetryPolicy::default(), &eth_to_usdc("1")).await;

        assert!(inquiry.is_none());
        assert_eq!(source.calls(), 6);
        assert!(started.elapsed() >= Duration::from_secs(25));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_symbol_is_not_retried() {
        let source = FlakySource::succeeding_on(1);
        let registry = TokenRegistry::builtin();
        let quoter = QuoteAdapter::new(source.clone());

        let started = Instant::now();
        let request = PriceInquiryRequest::new("NOPE", Decimal::ONE, "USDC", ids::OPTIMISM);
        let inquiry = get_price_inquiry(&registry, &quoter, &RetryPolicy::default(), &request).await;

        assert!(inquiry.is_none());
        assert_eq!(source.calls(), 0);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_registry_chain_is_terminal() {
        let source = FlakySource::succeeding_on(1);
        let registry = TokenRegistry::builtin();
        let quoter = QuoteAdapter::new(source.clone());

        let request = PriceInquiryRequest::new("ETH", Decimal::ONE, "USDC", ids::BLAST);
        let inquiry = get_price_inquiry(&registry, &quoter, &RetryPolicy::default(), &request).await;

        assert!(inquiry.is_none());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_degenerate_amount_is_terminal() {
        let source = FlakySource::succeeding_on(1);
        let registry = TokenRegistry::builtin();
        let quoter = QuoteAdapter::new(source.clone());

        // Rounds to zero USDC base units
        let request = PriceInquiryRequest::new(
            "USDC",
            Decimal::from_str("0.0000001").unwrap(),
            "ETH",
            ids::OPTIMISM,
        );
        let inquiry = get_price_inquiry(&registry, &quoter, &RetryPolicy::default(), &request).await;

        assert!(inquiry.is_none());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uses_allowance_holder_route() {
        let source = FlakySource::succeeding_on(2);
        let registry = TokenRegistry::builtin();
        let quoter = QuoteAdapter::new(source.clone());
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(10),
        };

        let output = RetryController::new(&registry, &quoter, policy)
            .run(&eth_to_usdc("2"))
            .await
            .unwrap();

        assert_eq!(output.price.buy_amount.as_deref(), Some("4000000000"));
        let routes = source.routes.lock().unwrap();
        assert_eq!(routes.as_slice(), &[PriceRoute::AllowanceHolder; 2]);
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from(&RetryConfig {
            max_attempts: 0,
            delay_secs: 2,
        });
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay, Duration::from_secs(2));
        assert_eq!(RetryPolicy::default().max_attempts, 6);
    }
}
