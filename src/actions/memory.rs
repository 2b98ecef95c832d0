//! Memory store implementations
//!
//! - `InMemoryStore`: process-local tables, handy for tests and one-shot CLI runs
//! - `JsonlMemoryStore`: append-only JSON Lines file, one record per line

use super::runtime::{Memory, MemoryStore};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Table holding price inquiry records
pub const PRICE_INQUIRY_TABLE: &str = "price_inquiries";

/// Memory tables kept in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Memory>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a table, in insertion order
    pub async fn memories(&self, table: &str) -> Vec<Memory> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn create_memory(&self, memory: Memory, table: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().push(memory);
        Ok(())
    }
}

/// Line in the memory log
#[derive(Debug, Serialize, Deserialize)]
pub struct MemoryLogEntry {
    pub timestamp: DateTime<Utc>,
    pub table: String,
    pub memory: Memory,
}

/// Writer for memory log entries
struct MemoryLogWriter {
    path: PathBuf,
}

impl MemoryLogWriter {
    fn write(&self, entry: &MemoryLogEntry) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// Memory store appending every record to a JSONL file
pub struct JsonlMemoryStore {
    writer: Arc<Mutex<MemoryLogWriter>>,
}

impl JsonlMemoryStore {
    /// Create a store writing to `log_path` (created on first write)
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(MemoryLogWriter {
                path: log_path.into(),
            })),
        }
    }
}

#[async_trait]
impl MemoryStore for JsonlMemoryStore {
    async fn create_memory(&self, memory: Memory, table: &str) -> Result<()> {
        let entry = MemoryLogEntry {
            timestamp: Utc::now(),
            table: table.to_string(),
            memory,
        };

        let writer = self.writer.lock().await;
        writer.write(&entry).map_err(|e| {
            tracing::warn!(error = %e, path = %writer.path.display(), "Failed to write memory log entry");
            Error::Memory(e.to_string())
        })
    }
}
