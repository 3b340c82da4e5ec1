#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/market/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Session cache implementations for market indicator providers.
//!
//! This crate provides implementations of the [`SessionCache`] trait from `market-core`:
//!
//! - [`InMemorySessionCache`] - TTL-bounded in-memory cache (default)
//! - [`NoopSessionCache`] - No-op cache that forces a bootstrap every cycle

/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

// Re-export the trait for convenience
pub use market_core::SessionCache;

// Re-export implementations
pub use memory::InMemorySessionCache;
pub use noop::NoopSessionCache;
