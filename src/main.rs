//! 0x price agent CLI
//!
//! Command-line front end for the indicative price actions.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;
use zerox_price_actions::actions::{
    Action, AgentRuntime, InMemoryStore, JsonlMemoryStore, MemoryStore, Message, Response, State,
    StaticExtractor, TracingTraceSink, ValidatedSwapParams,
};
use zerox_price_actions::amounts::parse_amount;
use zerox_price_actions::config::{EnvSettings, Settings, ZeroExCredentials};
use zerox_price_actions::pricing::{format_amounts, render, RetryController};
use zerox_price_actions::tokens::{BuiltinTokenSource, TokenListSource, TokenSource};
use zerox_price_actions::tools::{QuoteAdapter, ZeroExClient};
use zerox_price_actions::{
    Chain, Config, Error, GetIndicativePriceAction, PriceInquiryRequest, Result, RetryPolicy,
    TokenRegistry,
};

#[derive(Parser)]
#[command(name = "zerox-agent")]
#[command(about = "Indicative token prices from the 0x swap API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a price with retry (allowance-holder route)
    Price {
        /// Token to sell (symbol)
        #[arg(long)]
        sell: String,

        /// Human-readable amount to sell
        #[arg(long)]
        amount: String,

        /// Token to buy (symbol)
        #[arg(long)]
        buy: String,

        /// Chain name (defaults to the configured chain)
        #[arg(short = 'n', long)]
        chain: Option<String>,
    },

    /// Run the interactive price action once (single fetch, memory persisted)
    Quote {
        /// Token to sell (symbol)
        #[arg(long)]
        sell: String,

        /// Human-readable amount to sell
        #[arg(long)]
        amount: String,

        /// Token to buy (symbol)
        #[arg(long)]
        buy: String,

        /// Chain name (defaults to the configured chain)
        #[arg(short = 'n', long)]
        chain: Option<String>,
    },

    /// List supported chains
    Chains,

    /// List known tokens on a chain
    Tokens {
        /// Chain name
        #[arg(short = 'n', long)]
        chain: String,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging, RUST_LOG wins over the verbosity flag
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (plain, json) = if cli.json_logs {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };

    tracing_subscriber::registry()
        .with(plain)
        .with(json)
        .with(filter)
        .init();

    // Load config
    let config = if let Some(config_path) = cli.config {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("{}: {}", config_path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Price {
            sell,
            amount,
            buy,
            chain,
        } => {
            let chain = resolve_chain(chain.as_deref(), &config)?;
            run_price(&config, sell, amount, buy, chain).await?;
        }
        Commands::Quote {
            sell,
            amount,
            buy,
            chain,
        } => {
            let chain = chain.unwrap_or_else(|| config.default_chain.name().to_string());
            run_quote(config, &sell, &amount, &buy, &chain).await?;
        }
        Commands::Chains => {
            for chain in Chain::ALL {
                println!("{:<10} {}", chain.name(), chain.chain_id());
            }
        }
        Commands::Tokens { chain } => {
            let chain: Chain = chain.parse()?;
            run_tokens(&config, chain).await?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn resolve_chain(name: Option<&str>, config: &Config) -> Result<Chain> {
    match name {
        Some(name) => name.parse(),
        None => Ok(config.default_chain),
    }
}

fn token_registry(config: &Config) -> TokenRegistry {
    let source: Arc<dyn TokenSource> = match &config.token_list_url {
        Some(url) => {
            tracing::info!(url = %url, "Using remote token list");
            Arc::new(TokenListSource::new(url.clone()))
        }
        None => Arc::new(BuiltinTokenSource),
    };
    TokenRegistry::new(source)
}

async fn run_price(
    config: &Config,
    sell: String,
    amount: String,
    buy: String,
    chain: Chain,
) -> Result<()> {
    let credentials = ZeroExCredentials::from_settings(&EnvSettings, config)?;
    let quoter = QuoteAdapter::new(Arc::new(ZeroExClient::from_credentials(&credentials)));
    let registry = token_registry(config);
    let policy = RetryPolicy::from(&config.retry);

    let mut request = PriceInquiryRequest::new(sell, parse_amount(&amount)?, buy, chain.chain_id());
    request.taker = credentials.taker;

    tracing::info!(
        sell = %request.sell_symbol,
        amount = %request.sell_amount,
        buy = %request.buy_symbol,
        chain = %chain,
        max_attempts = policy.max_attempts,
        "Looking up indicative price"
    );

    let max_attempts = policy.max_attempts;
    let output = RetryController::new(&registry, &quoter, policy)
        .run(&request)
        .await
        .ok_or(Error::PriceUnavailable(max_attempts))?;

    if let Some(amounts) = format_amounts(
        &output.price,
        &output.inquiry.buy_token_object,
        &output.inquiry.sell_token_object,
    ) {
        println!("{}", render(&amounts, chain.name(), false));
    }
    println!("{}", serde_json::to_string_pretty(&output.inquiry)?);
    Ok(())
}

async fn run_quote(config: Config, sell: &str, amount: &str, buy: &str, chain: &str) -> Result<()> {
    let params = ValidatedSwapParams::parse(sell, amount, buy, chain)?;
    let extracted = json!({
        "sellTokenSymbol": params.sell_token_symbol,
        "sellAmount": params.sell_amount.to_string(),
        "buyTokenSymbol": params.buy_token_symbol,
        "chain": params.chain,
    });

    let memory: Arc<dyn MemoryStore> = match &config.memory_log_path {
        Some(path) => Arc::new(JsonlMemoryStore::new(path)),
        None => Arc::new(InMemoryStore::new()),
    };
    let settings: Arc<dyn Settings> = Arc::new(EnvSettings);
    let registry = Arc::new(token_registry(&config));

    let runtime = AgentRuntime {
        agent_id: Uuid::new_v4(),
        config,
        settings,
        extractor: Arc::new(StaticExtractor::new(extracted)),
        memory,
        trace: Arc::new(TracingTraceSink),
        registry,
    };

    let action = GetIndicativePriceAction::new();
    if !action.validate(&runtime, &Message::new(Uuid::nil(), Uuid::nil(), "")).await {
        return Err(Error::Config(format!(
            "{} is not configured",
            zerox_price_actions::ZERO_EX_API_KEY
        )));
    }

    let message = Message::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        format!("What would I get for {} {} in {} on {}?", amount, sell, buy, chain),
    );
    let state = State::from_message(&message);
    let callback = |response: Response| println!("{}", response.text);

    let succeeded = action.handler(&runtime, &message, &state, &callback).await;
    tracing::debug!(action = action.name(), succeeded, "Action finished");
    Ok(())
}

async fn run_tokens(config: &Config, chain: Chain) -> Result<()> {
    let registry = token_registry(config);
    registry.initialize_chain(chain.chain_id()).await?;

    for token in registry.tokens_for_chain(chain.chain_id()).await {
        println!(
            "{:<8} {:>2} {}",
            token.symbol, token.decimals, token.address
        );
    }
    Ok(())
}
