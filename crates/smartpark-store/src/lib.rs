//! Remote document store for the SmartPark controller.
//!
//! The store holds the authorization root (user records plus the
//! active-reservations list), per-user arrival flags and the published
//! occupancy document. Two backends implement [`RemoteStore`]:
//!
//! - [`RestStore`]: Firebase-style REST (`{base}/{path}.json`)
//! - [`MemoryStore`]: in-process document tree for tests and offline demos
//!
//! Documents come back with loosely defined shapes. The [`documents`]
//! module parses them once at the boundary into typed records.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use smartpark_store::{MemoryStore, RemoteStore};
//!
//! # #[tokio::main]
//! # async fn main() -> smartpark_store::Result<()> {
//! let store = MemoryStore::new();
//! store.put("estado", &json!({"libres": 4})).await?;
//! assert_eq!(store.get("estado/libres").await?, json!(4));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod documents;
pub mod error;
pub mod memory;
pub mod paths;
pub mod store;

pub use client::RestStore;
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use paths::StorePaths;
pub use store::{AnyStore, RemoteStore};
