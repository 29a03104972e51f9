//! In-process document tree.
//!
//! Mirrors the REST semantics the station relies on: `get` of a missing
//! path is `null`, `put` replaces (creating parents), `patch` merges the
//! children of an object. An offline switch makes every call fail with a
//! transport error, and the most recent calls are recorded for assertions.

use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{RemoteStore, Result, StoreError};

/// Requests kept in the log; older ones are dropped.
pub const REQUEST_LOG_CAPACITY: usize = 1024;

/// Kind of request seen by a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Get,
    Put,
    Patch,
}

#[derive(Debug, Default)]
struct Inner {
    tree: Value,
    offline: bool,
    requests: VecDeque<(RequestKind, String)>,
}

/// Shared in-memory store. Clones see the same tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn lookup<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(tree, |node, key| match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn slot_mut<'a>(tree: &'a mut Value, path: &str) -> &'a mut Value {
    segments(path).fold(tree, |node, key| {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        match node {
            Value::Object(map) => map.entry(key.to_string()).or_insert(Value::Null),
            _ => unreachable!("node was just replaced by an object"),
        }
    })
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing tree.
    pub fn with_tree(tree: Value) -> Self {
        let store = Self::new();
        store.lock().tree = tree;
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read a document synchronously, bypassing the request log.
    pub fn document(&self, path: &str) -> Value {
        lookup(&self.lock().tree, path).cloned().unwrap_or(Value::Null)
    }

    /// Write a document synchronously, bypassing the request log.
    pub fn set_document(&self, path: &str, value: Value) {
        *slot_mut(&mut self.lock().tree, path) = value;
    }

    /// Make every following request fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// The last [`REQUEST_LOG_CAPACITY`] requests, oldest first.
    pub fn requests(&self) -> Vec<(RequestKind, String)> {
        self.lock().requests.iter().cloned().collect()
    }

    /// Number of requests of one kind to one path.
    pub fn request_count(&self, kind: RequestKind, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|(k, p)| *k == kind && p == path)
            .count()
    }

    fn begin(&self, kind: RequestKind, path: &str) -> Result<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        if inner.requests.len() == REQUEST_LOG_CAPACITY {
            inner.requests.pop_front();
        }
        inner.requests.push_back((kind, path.to_string()));
        if inner.offline {
            return Err(StoreError::transport(path, "store offline"));
        }
        Ok(inner)
    }
}

impl RemoteStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Value> {
        let inner = self.begin(RequestKind::Get, path)?;
        Ok(lookup(&inner.tree, path).cloned().unwrap_or(Value::Null))
    }

    async fn put(&self, path: &str, value: &Value) -> Result<()> {
        let mut inner = self.begin(RequestKind::Put, path)?;
        *slot_mut(&mut inner.tree, path) = value.clone();
        Ok(())
    }

    async fn patch(&self, path: &str, value: &Value) -> Result<()> {
        let Value::Object(children) = value else {
            return Err(StoreError::malformed(path, "patch body must be an object"));
        };
        let mut inner = self.begin(RequestKind::Patch, path)?;
        let target = slot_mut(&mut inner.tree, path);
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        if let Value::Object(map) = target {
            for (key, child) in children {
                map.insert(key.clone(), child.clone());
            }
        }
        Ok(())
    }
}
