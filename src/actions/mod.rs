//! Agent-facing actions and the runtime surface they run against

pub mod memory;
pub mod params;
pub mod runtime;

mod get_indicative_price;

pub use get_indicative_price::GetIndicativePriceAction;
pub use memory::{InMemoryStore, JsonlMemoryStore, PRICE_INQUIRY_TABLE};
pub use params::{ParamsError, SwapParams, ValidatedSwapParams};
pub use runtime::{
    AgentRuntime, Callback, ChannelCallback, Extractor, Memory, MemoryStore, Message, Response,
    State, StaticExtractor, TraceSink, TracingTraceSink,
};

use async_trait::async_trait;

/// A named capability the agent can invoke for a chat message
#[async_trait]
pub trait Action: Send + Sync {
    /// Unique action name
    fn name(&self) -> &'static str;

    /// Alternative names the planner may use
    fn similes(&self) -> &'static [&'static str];

    fn description(&self) -> &'static str;

    /// Whether the action can run at all in this runtime
    async fn validate(&self, runtime: &AgentRuntime, message: &Message) -> bool;

    /// Handle one message, replying through `callback`
    ///
    /// Returns `true` only when the action completed successfully.
    async fn handler(
        &self,
        runtime: &AgentRuntime,
        message: &Message,
        state: &State,
        callback: &dyn Callback,
    ) -> bool;
}
