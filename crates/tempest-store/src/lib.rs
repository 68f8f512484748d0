//! Narrow state-store contract consumed by the telemetry engine
//!
//! The engine needs exactly three capabilities from whatever holds current
//! values: read a current value, upsert a value (optionally self-expiring),
//! and idempotently register a named node. Persistent backends are a host
//! concern; the bundled `MemoryStore` backs tests and the default daemon
//! wiring.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl StateValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StateValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StateValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// A current value together with the instant it was written
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub value: StateValue,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The get/upsert/ensure contract the engine runs against
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Current value for a path, if one exists and has not expired
    async fn get_current_value(&self, path: &str) -> StoreResult<Option<StoredValue>>;

    /// Create or overwrite a value; with `expiry` set, the value clears
    /// itself after that much silence
    async fn upsert_value(
        &self,
        path: &str,
        value: StateValue,
        expiry: Option<Duration>,
    ) -> StoreResult<()>;

    /// Idempotent registration of a named node with a display descriptor
    async fn ensure_node(&self, path: &str, descriptor: &str) -> StoreResult<()>;
}

#[async_trait]
impl<S: StateStore + ?Sized> StateStore for std::sync::Arc<S> {
    async fn get_current_value(&self, path: &str) -> StoreResult<Option<StoredValue>> {
        (**self).get_current_value(path).await
    }

    async fn upsert_value(
        &self,
        path: &str,
        value: StateValue,
        expiry: Option<Duration>,
    ) -> StoreResult<()> {
        (**self).upsert_value(path, value, expiry).await
    }

    async fn ensure_node(&self, path: &str, descriptor: &str) -> StoreResult<()> {
        (**self).ensure_node(path, descriptor).await
    }
}

struct Entry {
    value: StateValue,
    timestamp: DateTime<Utc>,
    expires_at: Option<Instant>,
}

/// In-process store: a path-keyed map behind an async lock
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Entry>>,
    nodes: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor a node was registered with, if any
    pub async fn node_descriptor(&self, path: &str) -> Option<String> {
        self.nodes.read().await.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get_current_value(&self, path: &str) -> StoreResult<Option<StoredValue>> {
        let values = self.values.read().await;
        Ok(values
            .get(path)
            .filter(|entry| entry.expires_at.map_or(true, |at| Instant::now() < at))
            .map(|entry| StoredValue {
                value: entry.value.clone(),
                timestamp: entry.timestamp,
            }))
    }

    async fn upsert_value(
        &self,
        path: &str,
        value: StateValue,
        expiry: Option<Duration>,
    ) -> StoreResult<()> {
        let mut values = self.values.write().await;
        values.insert(
            path.to_string(),
            Entry {
                value,
                timestamp: Utc::now(),
                expires_at: expiry.map(|expiry| Instant::now() + expiry),
            },
        );
        Ok(())
    }

    async fn ensure_node(&self, path: &str, descriptor: &str) -> StoreResult<()> {
        let mut nodes = self.nodes.write().await;
        nodes
            .entry(path.to_string())
            .or_insert_with(|| descriptor.to_string());
        Ok(())
    }
}
