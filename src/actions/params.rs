//! Swap parameter extraction schema
//!
//! The extractor is handed [`SwapParams::schema`] and a prompt built from
//! [`SWAP_PARAMS_TEMPLATE`]. Its output is loosely typed, so every field is
//! checked on its own and each one that is absent or of the wrong type is
//! reported back by a fixed, human-readable name.

use crate::amounts::{decimal_from_f64, parse_amount};
use crate::config::Chain;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use ts_rs::TS;

/// Prompt template for swap parameter extraction
pub const SWAP_PARAMS_TEMPLATE: &str = r#"Given the recent messages below:

{{recentMessages}}

Extract the following information about the requested token price:
- Sell token symbol (e.g. ETH, USDC)
- Sell amount (a number)
- Buy token symbol
- Chain name, one of: {{supportedChains}}

Respond with a JSON object with the keys "sellTokenSymbol", "sellAmount",
"buyTokenSymbol" and "chain". Use null for any value that cannot be
determined from the messages."#;

/// Fill the template placeholders for one turn
pub fn compose_context(template: &str, recent_messages: &str) -> String {
    template
        .replace("{{recentMessages}}", recent_messages)
        .replace("{{supportedChains}}", &Chain::supported_names())
}

/// Raw extraction output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SwapParams {
    /// Symbol of the token to sell
    pub sell_token_symbol: Option<String>,
    /// Human-readable amount of the sell token
    #[schemars(with = "Option<f64>")]
    #[ts(type = "number | null")]
    pub sell_amount: Option<Decimal>,
    /// Symbol of the token to buy
    pub buy_token_symbol: Option<String>,
    /// Chain name
    pub chain: Option<String>,
}

/// Swap parameters with every field present
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSwapParams {
    pub sell_token_symbol: String,
    pub sell_amount: Decimal,
    pub buy_token_symbol: String,
    pub chain: String,
}

/// Why extracted parameters cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    /// Fields that are absent, in fixed order
    #[error("missing {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// A numeric amount that cannot be represented exactly
    #[error("invalid sell amount {0}")]
    InvalidAmount(String),
}

/// Read the extracted amount without going through a float when avoidable
///
/// `Ok(None)` means absent or not a number at all.
fn extracted_amount(value: Option<&Value>) -> Result<Option<Decimal>, ParamsError> {
    match value {
        Some(Value::Number(n)) => {
            let parsed = if let Some(i) = n.as_i64() {
                Ok(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Decimal::from(u))
            } else {
                n.as_f64()
                    .ok_or_else(|| crate::Error::InvalidArgument(n.to_string()))
                    .and_then(decimal_from_f64)
            };
            parsed
                .map(Some)
                .map_err(|_| ParamsError::InvalidAmount(n.to_string()))
        }
        Some(Value::String(s)) => {
            let raw = s.trim();
            match parse_amount(raw) {
                Ok(amount) => Ok(Some(amount)),
                Err(_) if raw.parse::<f64>().is_ok() => {
                    Err(ParamsError::InvalidAmount(raw.to_string()))
                }
                Err(_) => Ok(None),
            }
        }
        _ => Ok(None),
    }
}

impl SwapParams {
    /// JSON schema handed to the extractor
    pub fn schema() -> Value {
        serde_json::to_value(schemars::schema_for!(SwapParams)).unwrap_or(Value::Bool(true))
    }

    /// Read the extractor's object field by field
    ///
    /// A field with the wrong type is treated as absent rather than failing
    /// the whole object. String amounts are parsed exactly; a number that
    /// does not fit a decimal is an error, not a missing field.
    pub fn from_extracted(value: &Value) -> Result<Self, ParamsError> {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        Ok(Self {
            sell_token_symbol: text("sellTokenSymbol"),
            sell_amount: extracted_amount(value.get("sellAmount"))?,
            buy_token_symbol: text("buyTokenSymbol"),
            chain: text("chain"),
        })
    }

    /// Check that every field is present
    ///
    /// On failure returns the missing field names in a fixed order.
    pub fn validate(&self) -> Result<ValidatedSwapParams, ParamsError> {
        match (
            &self.sell_token_symbol,
            self.sell_amount,
            &self.buy_token_symbol,
            &self.chain,
        ) {
            (Some(sell), Some(amount), Some(buy), Some(chain)) => Ok(ValidatedSwapParams {
                sell_token_symbol: sell.clone(),
                sell_amount: amount,
                buy_token_symbol: buy.clone(),
                chain: chain.clone(),
            }),
            _ => {
                let missing = [
                    (self.sell_token_symbol.is_none(), "sell token"),
                    (self.sell_amount.is_none(), "sell amount"),
                    (self.buy_token_symbol.is_none(), "buy token"),
                    (self.chain.is_none(), "chain"),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();
                Err(ParamsError::Missing(missing))
            }
        }
    }
}

impl ValidatedSwapParams {
    /// Build from CLI-style arguments
    pub fn parse(sell: &str, amount: &str, buy: &str, chain: &str) -> crate::Result<Self> {
        Ok(Self {
            sell_token_symbol: sell.to_string(),
            sell_amount: parse_amount(amount)?,
            buy_token_symbol: buy.to_string(),
            chain: chain.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amounts::to_base_units;
    use alloy::primitives::U256;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_complete_params_validate() {
        let params = SwapParams::from_extracted(&json!({
            "sellTokenSymbol": "ETH",
            "sellAmount": 2,
            "buyTokenSymbol": "USDC",
            "chain": "optimism"
        }))
        .unwrap();
        let validated = params.validate().unwrap();
        assert_eq!(validated.sell_token_symbol, "ETH");
        assert_eq!(validated.sell_amount, Decimal::from(2));
        assert_eq!(validated.buy_token_symbol, "USDC");
        assert_eq!(validated.chain, "optimism");
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let params = SwapParams::from_extracted(&json!({
            "sellTokenSymbol": null,
            "sellAmount": 1.5,
            "buyTokenSymbol": "USDC",
            "chain": null
        }))
        .unwrap();
        assert_eq!(
            params.validate().unwrap_err(),
            ParamsError::Missing(vec!["sell token", "chain"])
        );

        let empty = SwapParams::from_extracted(&json!({})).unwrap();
        assert_eq!(
            empty.validate().unwrap_err(),
            ParamsError::Missing(vec!["sell token", "sell amount", "buy token", "chain"])
        );
    }

    #[test]
    fn test_wrong_types_count_as_missing() {
        let params = SwapParams::from_extracted(&json!({
            "sellTokenSymbol": 42,
            "sellAmount": "lots",
            "buyTokenSymbol": "  ",
            "chain": ["base"]
        }))
        .unwrap();
        assert_eq!(
            params.validate().unwrap_err(),
            ParamsError::Missing(vec!["sell token", "sell amount", "buy token", "chain"])
        );
    }

    #[test]
    fn test_numeric_string_amount() {
        let params = SwapParams::from_extracted(&json!({
            "sellTokenSymbol": "USDC",
            "sellAmount": "0.25",
            "buyTokenSymbol": "ETH",
            "chain": "base"
        }))
        .unwrap();
        assert_eq!(
            params.validate().unwrap().sell_amount,
            Decimal::from_str("0.25").unwrap()
        );
    }

    #[test]
    fn test_string_amount_keeps_full_precision() {
        let params = SwapParams::from_extracted(&json!({
            "sellTokenSymbol": "ETH",
            "sellAmount": "1.000000000000000001",
            "buyTokenSymbol": "USDC",
            "chain": "base"
        }))
        .unwrap()
        .validate()
        .unwrap();
        assert_eq!(
            params.sell_amount,
            Decimal::from_str("1.000000000000000001").unwrap()
        );
        assert_eq!(
            to_base_units(&params.sell_amount, 18).unwrap(),
            U256::from(1_000_000_000_000_000_001u64)
        );
    }

    #[test]
    fn test_cli_amount_survives_extraction() {
        let cli = ValidatedSwapParams::parse("ETH", "1.000000000000000001", "USDC", "base").unwrap();
        let extracted = SwapParams::from_extracted(&json!({
            "sellTokenSymbol": cli.sell_token_symbol,
            "sellAmount": cli.sell_amount.to_string(),
            "buyTokenSymbol": cli.buy_token_symbol,
            "chain": cli.chain,
        }))
        .unwrap()
        .validate()
        .unwrap();
        assert_eq!(extracted, cli);
    }

    #[test]
    fn test_integer_amount_is_exact() {
        let params = SwapParams::from_extracted(&json!({ "sellAmount": 123456789012345678u64 }))
            .unwrap();
        assert_eq!(params.sell_amount, Some(Decimal::from(123456789012345678u64)));
    }

    #[test]
    fn test_unrepresentable_amount_is_invalid_not_missing() {
        let number = SwapParams::from_extracted(&json!({
            "sellTokenSymbol": "ETH",
            "sellAmount": 1e30,
            "buyTokenSymbol": "USDC",
            "chain": "base"
        }));
        assert!(matches!(number, Err(ParamsError::InvalidAmount(_))));

        let text = SwapParams::from_extracted(&json!({ "sellAmount": "1e30" }));
        assert_eq!(text, Err(ParamsError::InvalidAmount("1e30".to_string())));
    }

    #[test]
    fn test_schema_lists_all_fields() {
        let schema = SwapParams::schema();
        let properties = &schema["properties"];
        for key in ["sellTokenSymbol", "sellAmount", "buyTokenSymbol", "chain"] {
            assert!(properties[key].is_object(), "missing {key} in schema");
        }
    }

    #[test]
    fn test_compose_context() {
        let context = compose_context(SWAP_PARAMS_TEMPLATE, "sell 2 eth for usdc on base");
        assert!(context.contains("sell 2 eth for usdc on base"));
        assert!(context.contains("optimism"));
        assert!(!context.contains("{{"));
    }

    #[test]
    fn test_parse_cli_params() {
        let params = ValidatedSwapParams::parse("ETH", "1.5", "USDC", "base").unwrap();
        assert_eq!(params.sell_amount, Decimal::from_str("1.5").unwrap());
        assert!(ValidatedSwapParams::parse("ETH", "abc", "USDC", "base").is_err());
    }
}
