//! Indicative price pipeline
//!
//! Token resolution, amount normalization and quote fetching, plus the
//! `PriceInquiry` record produced by a successful run.

mod format;
mod retry;

pub use format::{format_amounts, render, FormattedAmounts, CALL_TO_ACTION};
pub use retry::{
    get_price_inquiry, PriceInquiryRequest, RetryController, RetryOutput, RetryPolicy,
    StageFailure,
};

use crate::config::ChainId;
use crate::tokens::TokenMetadata;
use alloy::primitives::U256;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Record of a successful price lookup
///
/// Persisted as memory content and handed back to the caller; never mutated
/// after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInquiry {
    pub sell_token_object: TokenMetadata,
    pub buy_token_object: TokenMetadata,
    /// Sell amount in base units (decimal integer string)
    pub sell_amount_base_units: String,
    pub chain_id: ChainId,
    /// RFC 3339 creation time
    pub timestamp: String,
}

impl PriceInquiry {
    pub fn new(
        sell_token: TokenMetadata,
        buy_token: TokenMetadata,
        sell_amount_base_units: U256,
        chain_id: ChainId,
    ) -> Self {
        Self {
            sell_token_object: sell_token,
            buy_token_object: buy_token,
            sell_amount_base_units: sell_amount_base_units.to_string(),
            chain_id,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::addresses;

    #[test]
    fn test_inquiry_serializes_camel_case() {
        let inquiry = PriceInquiry::new(
            TokenMetadata::new("ETH", addresses::NATIVE, 18),
            TokenMetadata::new("USDC", addresses::USDC_BASE, 6),
            U256::from(2_000_000_000_000_000_000u128),
            8453,
        );

        let value = serde_json::to_value(&inquiry).unwrap();
        assert_eq!(value["sellAmountBaseUnits"], "2000000000000000000");
        assert_eq!(value["chainId"], 8453);
        assert_eq!(value["sellTokenObject"]["symbol"], "ETH");
        assert_eq!(value["buyTokenObject"]["decimals"], 6);
        assert!(chrono::DateTime::parse_from_rfc3339(value["timestamp"].as_str().unwrap()).is_ok());
    }
}
