//! 0x Indicative Price Actions
//!
//! Agent actions that answer "what would I get for N of token A in token B on
//! chain C" using the 0x swap API:
//! - Resolve token symbols per chain through a lazily loaded registry
//! - Normalize human amounts into base units
//! - Fetch indicative prices, either once (interactive) or with bounded retry
//! - Persist each successful inquiry as an agent memory
//!
//! Prices are non-binding. Nothing here signs or submits transactions.

pub mod actions;
pub mod amounts;
pub mod config;
pub mod pricing;
pub mod tokens;
pub mod tools;

mod error;

// Re-export commonly used types
pub use actions::{Action, AgentRuntime, GetIndicativePriceAction};
pub use config::{Chain, ChainId, Config, ZERO_EX_API_KEY};
pub use error::{Error, Result};
pub use pricing::{get_price_inquiry, PriceInquiry, PriceInquiryRequest, RetryPolicy};
pub use tokens::{TokenMetadata, TokenRegistry};
