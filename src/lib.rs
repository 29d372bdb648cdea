//! taxrates - Cached query/mutation bindings for an admin tax-rate API
//!
//! Sits between an HTTP SDK client and UI consumers, wrapping each CRUD call
//! with cache-key derivation and invalidation so that list and detail views
//! stay consistent without manual refetch wiring.
//!
//! # Architecture
//!
//! - **types**: API request/response shapes (serde)
//! - **cache**: keyed in-memory query cache with prefix invalidation
//! - **sdk**: the HTTP client behind a trait seam (mockable in tests)
//! - **hooks**: the binding layer exposed to consumers (read-one, read-many,
//!   create, update, delete)
//! - **config**: YAML configuration for host, token, and cache tuning

pub mod cache;
pub mod config;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod sdk;
pub mod types;

// Re-exports
pub use error::{Error, Result};
