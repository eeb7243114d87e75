#![warn(missing_docs)]
//! # stratus-memory
//!
//! In-memory [`CacheStore`](stratus_core::CacheStore) implementation for
//! Stratus, backed by [`DashMap`](dashmap::DashMap).
//!
//! The store keeps one concurrent map per partition, so per-key operations
//! are atomic: a reader racing a writer observes either the previous complete
//! entry or the new one, never a partial write. That is the only atomicity
//! the engine relies on.
//!
//! Data is **not persisted** — the store is intended for hosts without
//! durable storage and for tests, where it substitutes for a real backend
//! without touching strategy logic.
//!
//! ```
//! use stratus_memory::MemoryStore;
//!
//! let store = MemoryStore::new();
//! ```

mod store;

pub use store::{MemoryPartition, MemoryStore};
