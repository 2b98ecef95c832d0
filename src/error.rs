//! Error types for the 0x price actions

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("0x API error ({status}): {message}")]
    ZeroEx { status: u16, message: String },

    #[error("No liquidity available for this pair")]
    NoLiquidity,

    #[error("No price available after {0} attempts")]
    PriceUnavailable(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("Amount is too small to quote: {0}")]
    DegenerateAmount(String),

    #[error("Token registry error: {0}")]
    Registry(String),

    #[error("Memory store error: {0}")]
    Memory(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
