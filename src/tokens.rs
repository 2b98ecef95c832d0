//! Multi-chain token registry
//!
//! Maps a token symbol to its on-chain metadata (address, decimals) per chain.
//! Catalogs are loaded lazily from a [`TokenSource`] the first time a chain is
//! initialized and are immutable afterwards.
//!
//! The registry is an explicit owned structure: share it behind an `Arc`
//! with the components that need it rather than through a global.

use crate::config::{chains::ids, ChainId};
use crate::{Error, Result};
use alloy::primitives::{address, Address};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};

/// Token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Token symbol (e.g., "USDC", "ETH")
    pub symbol: String,
    /// Token contract address (native gas tokens use the 0xEeee… sentinel)
    pub address: Address,
    /// Number of decimals
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TokenMetadata {
    pub fn new(symbol: impl Into<String>, address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            address,
            decimals,
            name: None,
        }
    }
}

/// Well-known token addresses per chain
pub mod addresses {
    use super::*;

    // === Native gas token sentinel (0x convention) ===
    pub const NATIVE: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

    // === Ethereum Mainnet ===
    pub const USDC_ETH: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    pub const USDT_ETH: Address = address!("dac17f958d2ee523a2206206994597c13d831ec7");
    pub const DAI_ETH: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
    pub const WETH_ETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    pub const WBTC_ETH: Address = address!("2260fac5e5542a773aa44fbcfedf7c193bc2c599");

    // === Arbitrum ===
    pub const USDC_ARB: Address = address!("af88d065e77c8cc2239327c5edb3a432268e5831");
    pub const USDC_E_ARB: Address = address!("ff970a61a04b1ca14834a43f5de4533ebddb5cc8");
    pub const USDT_ARB: Address = address!("fd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9");
    pub const DAI_ARB: Address = address!("da10009cbd5d07dd0cecc66161fc93d7c9000da1");
    pub const WETH_ARB: Address = address!("82af49447d8a07e3bd95bd0d56f35241523fbab1");
    pub const WBTC_ARB: Address = address!("2f2a2543b76a4166549f7aab2e75bef0aefc5b0f");

    // === Optimism ===
    pub const USDC_OPT: Address = address!("0b2c639c533813f4aa9d7837caf62653d097ff85");
    pub const USDC_E_OPT: Address = address!("7f5c764cbc14f9669b88837ca1490cca17c31607");
    pub const USDT_OPT: Address = address!("94b008aa00579c1307b0ef2c499ad98a8ce58e58");
    pub const DAI_OPT: Address = address!("da10009cbd5d07dd0cecc66161fc93d7c9000da1");
    pub const WETH_OPT: Address = address!("4200000000000000000000000000000000000006");

    // === Base ===
    pub const USDC_BASE: Address = address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913");
    pub const DAI_BASE: Address = address!("50c5725949a6f0c72e6c4a641f24049a917db0cb");
    pub const WETH_BASE: Address = address!("4200000000000000000000000000000000000006");

    // === Polygon ===
    pub const USDC_POLYGON: Address = address!("3c499c542cef5e3811e1192ce70d8cc03d5c3359");
    pub const USDT_POLYGON: Address = address!("c2132d05d31c914a87c6611c10748aeb04b58e8f");
    pub const DAI_POLYGON: Address = address!("8f3cf7ad23cd3cadbd9735aff958023239c6a063");
    pub const WETH_POLYGON: Address = address!("7ceb23fd6bc0add59e62ac25578270cff1b9f619");
    pub const WPOL_POLYGON: Address = address!("0d500b1d8e8ef31e21c99d1db9a6444d3adf1270");
}

/// Where chain catalogs come from
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Whether this source can provide a catalog for the chain
    fn supports_chain(&self, chain_id: ChainId) -> bool;

    /// Load every token known on the chain
    async fn load_chain(&self, chain_id: ChainId) -> Result<Vec<TokenMetadata>>;
}

/// Compiled-in catalog of well-known tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTokenSource;

impl BuiltinTokenSource {
    fn catalog(chain_id: ChainId) -> Option<Vec<TokenMetadata>> {
        use addresses::*;

        let t = TokenMetadata::new;
        let tokens = match chain_id {
            ids::ETHEREUM => vec![
                t("ETH", NATIVE, 18),
                t("WETH", WETH_ETH, 18),
                t("USDC", USDC_ETH, 6),
                t("USDT", USDT_ETH, 6),
                t("DAI", DAI_ETH, 18),
                t("WBTC", WBTC_ETH, 8),
            ],
            ids::ARBITRUM => vec![
                t("ETH", NATIVE, 18),
                t("WETH", WETH_ARB, 18),
                t("USDC", USDC_ARB, 6),
                t("USDC.E", USDC_E_ARB, 6),
                t("USDT", USDT_ARB, 6),
                t("DAI", DAI_ARB, 18),
                t("WBTC", WBTC_ARB, 8),
            ],
            ids::OPTIMISM => vec![
                t("ETH", NATIVE, 18),
                t("WETH", WETH_OPT, 18),
                t("USDC", USDC_OPT, 6),
                t("USDC.E", USDC_E_OPT, 6),
                t("USDT", USDT_OPT, 6),
                t("DAI", DAI_OPT, 18),
            ],
            ids::BASE => vec![
                t("ETH", NATIVE, 18),
                t("WETH", WETH_BASE, 18),
                t("USDC", USDC_BASE, 6),
                t("DAI", DAI_BASE, 18),
            ],
            ids::POLYGON => vec![
                t("POL", NATIVE, 18),
                t("WPOL", WPOL_POLYGON, 18),
                t("WETH", WETH_POLYGON, 18),
                t("USDC", USDC_POLYGON, 6),
                t("USDT", USDT_POLYGON, 6),
                t("DAI", DAI_POLYGON, 18),
            ],
            _ => return None,
        };
        Some(tokens)
    }
}

#[async_trait]
impl TokenSource for BuiltinTokenSource {
    fn supports_chain(&self, chain_id: ChainId) -> bool {
        matches!(
            chain_id,
            ids::ETHEREUM | ids::ARBITRUM | ids::OPTIMISM | ids::BASE | ids::POLYGON
        )
    }

    async fn load_chain(&self, chain_id: ChainId) -> Result<Vec<TokenMetadata>> {
        Self::catalog(chain_id)
            .ok_or_else(|| Error::Registry(format!("No built-in catalog for chain {}", chain_id)))
    }
}

/// Entry of a Uniswap-format token list
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenListEntry {
    chain_id: ChainId,
    address: Address,
    symbol: String,
    decimals: u8,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TokenList {
    tokens: Vec<TokenListEntry>,
}

/// Token catalog fetched from a Uniswap-format token list URL
///
/// The list is downloaded once and shared by every chain initialized
/// afterwards. A failed download is not cached.
pub struct TokenListSource {
    client: Client,
    url: String,
    list: OnceCell<Vec<TokenListEntry>>,
}

impl TokenListSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            list: OnceCell::new(),
        }
    }

    async fn entries(&self) -> Result<&[TokenListEntry]> {
        let list = self
            .list
            .get_or_try_init(|| async {
                tracing::debug!(url = %self.url, "Fetching token list");
                let response = self.client.get(&self.url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(Error::Registry(format!(
                        "Token list request failed with status {}",
                        status
                    )));
                }
                let list: TokenList = response.json().await?;
                Ok::<_, Error>(list.tokens)
            })
            .await?;
        Ok(list.as_slice())
    }
}

#[async_trait]
impl TokenSource for TokenListSource {
    fn supports_chain(&self, chain_id: ChainId) -> bool {
        crate::config::Chain::from_id(chain_id).is_some()
    }

    async fn load_chain(&self, chain_id: ChainId) -> Result<Vec<TokenMetadata>> {
        let tokens = self
            .entries()
            .await?
            .iter()
            .filter(|entry| entry.chain_id == chain_id)
            .map(|entry| TokenMetadata {
                symbol: entry.symbol.clone(),
                address: entry.address,
                decimals: entry.decimals,
                name: entry.name.clone(),
            })
            .collect();
        Ok(tokens)
    }
}

/// Tokens of one chain keyed by upper-cased symbol
type ChainCatalog = HashMap<String, TokenMetadata>;

/// Token registry providing symbol lookups per chain
pub struct TokenRegistry {
    source: Arc<dyn TokenSource>,
    catalogs: RwLock<HashMap<ChainId, Arc<OnceCell<ChainCatalog>>>>,
}

impl TokenRegistry {
    /// Create a registry backed by the given source
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            catalogs: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry backed by the compiled-in catalog
    pub fn builtin() -> Self {
        Self::new(Arc::new(BuiltinTokenSource))
    }

    /// Check whether the registry can serve the chain at all
    pub fn is_chain_supported(&self, chain_id: ChainId) -> bool {
        self.source.supports_chain(chain_id)
    }

    /// Load the catalog for a chain
    ///
    /// Idempotent: once a chain is loaded, later calls return immediately.
    /// Concurrent callers for the same chain share a single load.
    pub async fn initialize_chain(&self, chain_id: ChainId) -> Result<()> {
        if !self.is_chain_supported(chain_id) {
            return Err(Error::UnsupportedChain(chain_id.to_string()));
        }

        let cell = {
            let mut catalogs = self.catalogs.write().await;
            Arc::clone(catalogs.entry(chain_id).or_default())
        };

        cell.get_or_try_init(|| async {
            let tokens = self.source.load_chain(chain_id).await?;
            let mut catalog = ChainCatalog::with_capacity(tokens.len());
            for token in tokens {
                catalog
                    .entry(token.symbol.to_uppercase())
                    .or_insert(token);
            }
            tracing::info!(chain_id, tokens = catalog.len(), "Initialized token catalog");
            Ok::<_, Error>(catalog)
        })
        .await?;

        Ok(())
    }

    /// Initialize several chains concurrently, returning the per-chain outcome
    pub async fn initialize_chains(&self, chain_ids: &[ChainId]) -> Vec<(ChainId, Result<()>)> {
        let results = join_all(chain_ids.iter().map(|&id| self.initialize_chain(id))).await;
        chain_ids.iter().copied().zip(results).collect()
    }

    /// Look up a token by symbol (case-insensitive)
    ///
    /// Returns `None` for unknown symbols and for chains that have not been
    /// initialized yet.
    pub async fn get_token_by_symbol(&self, symbol: &str, chain_id: ChainId) -> Option<TokenMetadata> {
        let catalogs = self.catalogs.read().await;
        let Some(catalog) = catalogs.get(&chain_id).and_then(|cell| cell.get()) else {
            tracing::warn!(chain_id, symbol, "Token lookup on uninitialized chain");
            return None;
        };
        catalog.get(&symbol.trim().to_uppercase()).cloned()
    }

    /// All tokens of an initialized chain, sorted by symbol
    pub async fn tokens_for_chain(&self, chain_id: ChainId) -> Vec<TokenMetadata> {
        let catalogs = self.catalogs.read().await;
        let mut tokens: Vec<TokenMetadata> = catalogs
            .get(&chain_id)
            .and_then(|cell| cell.get())
            .map(|catalog| catalog.values().cloned().collect())
            .unwrap_or_default();
        tokens.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        tokens
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
