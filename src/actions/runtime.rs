//! Agent runtime collaborators
//!
//! Narrow interfaces to the surrounding chat runtime: structured extraction,
//! memory persistence, reply delivery and observability. The runtime owns
//! one instance of each plus the shared token registry and settings.

use crate::config::{Config, Settings};
use crate::tokens::TokenRegistry;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Incoming chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
}

impl Message {
    pub fn new(room_id: Uuid, user_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            room_id,
            user_id,
            text: text.into(),
        }
    }
}

/// Conversation state composed by the runtime for one turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub recent_messages: Vec<String>,
}

impl State {
    pub fn from_message(message: &Message) -> Self {
        Self {
            recent_messages: vec![message.text.clone()],
        }
    }

    pub fn recent_messages_text(&self) -> String {
        self.recent_messages.join("\n")
    }
}

/// Reply delivered to the chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl Response {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            content: None,
        }
    }

    pub fn with_content(text: impl Into<String>, content: Value) -> Self {
        Self {
            text: text.into(),
            content: Some(content),
        }
    }
}

/// Persisted memory record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub agent_id: Uuid,
    pub content: Value,
    pub created_at: DateTime<Utc>,
}

impl Memory {
    pub fn new(room_id: Uuid, user_id: Uuid, agent_id: Uuid, content: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            user_id,
            agent_id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// Best-effort structured extraction (LLM object generation)
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Produce an object for `context`, shaped by the JSON `schema`
    ///
    /// Fields the generator cannot determine come back as `null`.
    async fn generate(&self, context: &str, schema: &Value) -> Result<Value>;
}

/// Extractor returning a fixed object, for pre-extracted parameters
#[derive(Debug, Clone)]
pub struct StaticExtractor {
    object: Value,
}

impl StaticExtractor {
    pub fn new(object: Value) -> Self {
        Self { object }
    }
}

#[async_trait]
impl Extractor for StaticExtractor {
    async fn generate(&self, _context: &str, _schema: &Value) -> Result<Value> {
        Ok(self.object.clone())
    }
}

/// Append-only memory persistence, keyed by table name
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn create_memory(&self, memory: Memory, table: &str) -> Result<()>;
}

/// Reply delivery
#[async_trait]
pub trait Callback: Send + Sync {
    async fn send(&self, response: Response);
}

#[async_trait]
impl<F> Callback for F
where
    F: Fn(Response) + Send + Sync,
{
    async fn send(&self, response: Response) {
        self(response)
    }
}

/// Callback forwarding replies into a channel
#[derive(Debug, Clone)]
pub struct ChannelCallback {
    sender: mpsc::UnboundedSender<Response>,
}

impl ChannelCallback {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Response>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl Callback for ChannelCallback {
    async fn send(&self, response: Response) {
        if self.sender.send(response).is_err() {
            tracing::warn!("Reply dropped, callback receiver closed");
        }
    }
}

/// Fire-and-forget observability hook
pub trait TraceSink: Send + Sync {
    fn trace_result(&self, state: &State, response: &Response);
}

/// Trace sink that emits a structured log event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTraceSink;

impl TraceSink for TracingTraceSink {
    fn trace_result(&self, state: &State, response: &Response) {
        tracing::info!(
            target: "zerox_price_actions::trace",
            recent_messages = state.recent_messages.len(),
            response_text = %response.text,
            has_content = response.content.is_some(),
            "Action result"
        );
    }
}

/// Everything an action needs from the hosting agent
#[derive(Clone)]
pub struct AgentRuntime {
    pub agent_id: Uuid,
    pub config: Config,
    pub settings: Arc<dyn Settings>,
    pub extractor: Arc<dyn Extractor>,
    pub memory: Arc<dyn MemoryStore>,
    pub trace: Arc<dyn TraceSink>,
    pub registry: Arc<TokenRegistry>,
}

impl AgentRuntime {
    pub fn get_setting(&self, key: &str) -> Option<String> {
        self.settings.get_setting(key)
    }
}
