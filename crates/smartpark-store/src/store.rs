use serde_json::Value;

use crate::{MemoryStore, RestStore, Result};

/// Path-addressed JSON document store.
///
/// Paths are slash-separated and relative to the store base. A missing
/// document reads as `Value::Null`.
pub trait RemoteStore: Send + Sync {
    /// Read the document at `path`.
    async fn get(&self, path: &str) -> Result<Value>;

    /// Replace the document at `path`.
    async fn put(&self, path: &str, value: &Value) -> Result<()>;

    /// Merge the children of `value` into the document at `path`.
    async fn patch(&self, path: &str, value: &Value) -> Result<()>;
}

/// Enum wrapper for store backend dispatch.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyStore {
    Rest(RestStore),
    Memory(MemoryStore),
}

impl RemoteStore for AnyStore {
    async fn get(&self, path: &str) -> Result<Value> {
        match self {
            Self::Rest(store) => store.get(path).await,
            Self::Memory(store) => store.get(path).await,
        }
    }

    async fn put(&self, path: &str, value: &Value) -> Result<()> {
        match self {
            Self::Rest(store) => store.put(path, value).await,
            Self::Memory(store) => store.put(path, value).await,
        }
    }

    async fn patch(&self, path: &str, value: &Value) -> Result<()> {
        match self {
            Self::Rest(store) => store.patch(path, value).await,
            Self::Memory(store) => store.patch(path, value).await,
        }
    }
}

impl From<RestStore> for AnyStore {
    fn from(store: RestStore) -> Self {
        Self::Rest(store)
    }
}

impl From<MemoryStore> for AnyStore {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}
