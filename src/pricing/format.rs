//! Display formatting for indicative prices

use crate::amounts::to_human;
use crate::tokens::TokenMetadata;
use crate::tools::PriceResponse;

const SEPARATOR: &str = "────────────────";

/// Closing line of the interactive reply
pub const CALL_TO_ACTION: &str = "Happy with the price? Ask for a quote to continue with the swap.";

/// Human-readable amounts derived from a price response
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedAmounts {
    pub sell_amount: f64,
    pub buy_amount: f64,
    /// Buy tokens received per sell token
    pub rate: f64,
    pub sell_symbol: String,
    pub buy_symbol: String,
}

/// Scale the response's base-unit amounts by each token's decimals
///
/// Returns `None` when the response does not carry both amounts.
pub fn format_amounts(
    price: &PriceResponse,
    buy_token: &TokenMetadata,
    sell_token: &TokenMetadata,
) -> Option<FormattedAmounts> {
    let sell_amount = to_human(price.sell_amount_units()?, sell_token.decimals);
    let buy_amount = to_human(price.buy_amount_units()?, buy_token.decimals);
    let rate = if sell_amount > 0.0 {
        buy_amount / sell_amount
    } else {
        0.0
    };

    Some(FormattedAmounts {
        sell_amount,
        buy_amount,
        rate,
        sell_symbol: sell_token.symbol.clone(),
        buy_symbol: buy_token.symbol.clone(),
    })
}

/// Render the fixed-layout price block
pub fn render(amounts: &FormattedAmounts, chain_name: &str, with_call_to_action: bool) -> String {
    let mut lines = vec![
        "Indicative Price".to_string(),
        SEPARATOR.to_string(),
        format!("Sell: {:.4} {}", amounts.sell_amount, amounts.sell_symbol),
        format!("Buy: {:.4} {}", amounts.buy_amount, amounts.buy_symbol),
        format!(
            "Rate: 1 {} = {:.4} {}",
            amounts.sell_symbol, amounts.rate, amounts.buy_symbol
        ),
        format!("Chain: {}", chain_name),
        SEPARATOR.to_string(),
    ];
    if with_call_to_action {
        lines.push(CALL_TO_ACTION.to_string());
    }
    lines.join("\n")
}
