//! # state-store - durable key-value persistence
//!
//! The pipeline persists two record kinds (execution state and credit
//! ledgers) through a deliberately small contract:
//!
//! - **`get(key)`** - value or absent
//! - **`set(key, value, ttl?)`** - acknowledge once written
//!
//! There are no multi-key transactions and no compare-and-swap. Callers that
//! read-modify-write a key can race; that is accepted by the callers.
//!
//! ## Backends
//!
//! - [`InMemoryStore`] - process-local map with expiry, for tests and dry runs
//! - [`RestKvStore`] - Redis command protocol over HTTPS with bearer auth
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use state_store::{InMemoryStore, KeyValueStore};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryStore::new();
//!     store.set("session:abc", "{}".to_string(), Some(Duration::from_secs(60))).await?;
//!     assert_eq!(store.get("session:abc").await?.as_deref(), Some("{}"));
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod memory;
pub mod rest;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use rest::{RestKvConfig, RestKvStore};
pub use traits::KeyValueStore;
