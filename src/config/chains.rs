//! Chain name enumeration
//!
//! Fixed, bijective mapping between the human chain names users type in chat
//! and the numeric chain IDs the 0x API expects. Name lookups are
//! case-insensitive; anything outside the table is rejected before any
//! network call is made.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric EVM chain identifier
pub type ChainId = u64;

/// Chain ID constants
pub mod ids {
    pub const ETHEREUM: u64 = 1;
    pub const OPTIMISM: u64 = 10;
    pub const BSC: u64 = 56;
    pub const POLYGON: u64 = 137;
    pub const MANTLE: u64 = 5000;
    pub const BASE: u64 = 8453;
    pub const MODE: u64 = 34443;
    pub const ARBITRUM: u64 = 42161;
    pub const AVALANCHE: u64 = 43114;
    pub const LINEA: u64 = 59144;
    pub const BLAST: u64 = 81457;
    pub const SCROLL: u64 = 534352;
}

/// Chains supported by the 0x swap API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Optimism,
    Bsc,
    Polygon,
    Mantle,
    Base,
    Mode,
    Arbitrum,
    Avalanche,
    Linea,
    Blast,
    Scroll,
}

impl Chain {
    /// Every supported chain, in chain ID order
    pub const ALL: [Chain; 12] = [
        Chain::Ethereum,
        Chain::Optimism,
        Chain::Bsc,
        Chain::Polygon,
        Chain::Mantle,
        Chain::Base,
        Chain::Mode,
        Chain::Arbitrum,
        Chain::Avalanche,
        Chain::Linea,
        Chain::Blast,
        Chain::Scroll,
    ];

    pub fn chain_id(&self) -> ChainId {
        match self {
            Chain::Ethereum => ids::ETHEREUM,
            Chain::Optimism => ids::OPTIMISM,
            Chain::Bsc => ids::BSC,
            Chain::Polygon => ids::POLYGON,
            Chain::Mantle => ids::MANTLE,
            Chain::Base => ids::BASE,
            Chain::Mode => ids::MODE,
            Chain::Arbitrum => ids::ARBITRUM,
            Chain::Avalanche => ids::AVALANCHE,
            Chain::Linea => ids::LINEA,
            Chain::Blast => ids::BLAST,
            Chain::Scroll => ids::SCROLL,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Optimism => "optimism",
            Chain::Bsc => "bsc",
            Chain::Polygon => "polygon",
            Chain::Mantle => "mantle",
            Chain::Base => "base",
            Chain::Mode => "mode",
            Chain::Arbitrum => "arbitrum",
            Chain::Avalanche => "avalanche",
            Chain::Linea => "linea",
            Chain::Blast => "blast",
            Chain::Scroll => "scroll",
        }
    }

    /// Resolve a chain from its human name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Chain> {
        let needle = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == needle)
    }

    /// Resolve a chain from its numeric ID
    pub fn from_id(chain_id: ChainId) -> Option<Chain> {
        Self::ALL.into_iter().find(|c| c.chain_id() == chain_id)
    }

    /// Comma-separated list of supported chain names, for user-facing replies
    pub fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::from_name(s).ok_or_else(|| crate::Error::UnsupportedChain(s.to_string()))
    }
}
