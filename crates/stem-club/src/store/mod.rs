//! Narrow persistence boundary used by the intake workflows.
//!
//! The workflows only ever insert a record into a named collection or read an ordered
//! projection of one, so any backend satisfying [`RemoteStore`] can be substituted.

pub mod memory;
pub mod postgrest;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{StoreBackend, StoreConfig};

pub use memory::InMemoryStore;
pub use postgrest::PostgrestStore;

/// PostgreSQL SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Storage abstraction so the intake controllers can be exercised in isolation.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn insert(&self, collection: &str, record: Value) -> Result<(), RemoteError>;
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, RemoteError>;
}

/// Read-only projection of a collection, ascending by `order_by` when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub collection: String,
    pub columns: Vec<String>,
    pub order_by: Option<String>,
}

impl SelectQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            columns: Vec::new(),
            order_by: None,
        }
    }

    pub fn columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }
}

/// Failure reported by a remote store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("uniqueness constraint violated: {0}")]
    DuplicateKey(String),
    #[error("store rejected request with status {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("store transport failed: {0}")]
    Transport(String),
    #[error("unexpected store payload: {0}")]
    Decode(String),
}

/// Machine-checkable classification of a [`RemoteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    DuplicateKey,
    Other,
}

impl RemoteError {
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            RemoteError::DuplicateKey(_) => RemoteErrorKind::DuplicateKey,
            _ => RemoteErrorKind::Other,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            RemoteError::DuplicateKey(_) => "duplicate_key",
            RemoteError::Status { .. } => "status",
            RemoteError::Transport(_) => "transport",
            RemoteError::Decode(_) => "decode",
        }
    }
}

/// Backend selected at startup from [`StoreConfig`].
#[derive(Clone)]
pub enum StoreClient {
    Postgrest(PostgrestStore),
    Memory(InMemoryStore),
}

impl StoreClient {
    /// Build the configured backend; `seed` populates a memory store.
    pub fn from_config(
        config: &StoreConfig,
        seed: impl FnOnce() -> InMemoryStore,
    ) -> Result<Self, RemoteError> {
        match &config.backend {
            StoreBackend::Postgrest { url, anon_key } => Ok(Self::Postgrest(PostgrestStore::new(
                url.clone(),
                anon_key.clone(),
                config.timeout,
            )?)),
            StoreBackend::Memory => Ok(Self::Memory(seed())),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            StoreClient::Postgrest(_) => "postgrest",
            StoreClient::Memory(_) => "memory",
        }
    }
}

#[async_trait]
impl RemoteStore for StoreClient {
    async fn insert(&self, collection: &str, record: Value) -> Result<(), RemoteError> {
        match self {
            StoreClient::Postgrest(store) => store.insert(collection, record).await,
            StoreClient::Memory(store) => store.insert(collection, record).await,
        }
    }

    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, RemoteError> {
        match self {
            StoreClient::Postgrest(store) => store.select(query).await,
            StoreClient::Memory(store) => store.select(query).await,
        }
    }
}
