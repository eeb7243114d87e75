#![warn(missing_docs)]
//! # stratus-core
//!
//! Core traits and types for the Stratus request-interception caching engine.
//!
//! This crate provides the foundational abstractions that keep the engine
//! **host-agnostic** and **testable**. It defines the contracts that storage
//! backends (like `stratus-memory`) and hosting environments must implement.
//!
//! ## Architecture
//!
//! The engine in the `stratus` crate orchestrates caching strategies over two
//! injected capabilities, both defined here:
//!
//! - **Storage** ([`CacheStore`] / [`CachePartition`]) - versioned, partitioned
//!   response storage
//! - **Network** ([`Fetch`]) - the upstream fetch capability, with no built-in
//!   retry
//!
//! Alongside the capabilities live the value types that flow through them:
//! [`RequestDescriptor`], [`CacheKey`], [`ResponseSnapshot`], and
//! [`CacheEntry`].

pub mod entry;
pub mod error;
pub mod fetch;
pub mod request;
pub mod store;

pub use entry::{CacheEntry, ResponseSnapshot};
pub use error::StorageError;
pub use fetch::{Fetch, FetchError};
pub use request::{CacheKey, RequestDescriptor};
pub use store::{CachePartition, CacheStore, DeleteStatus, PartitionKey, StoreResult};

/// Raw byte data type used for response bodies.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
