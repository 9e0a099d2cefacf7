//! Cache layer sitting in front of every upstream provider
//!
//! This module provides an in-memory TTL store, a fetch wrapper that memoizes
//! upstream calls in it, and a fallback policy that answers with synthetic data
//! when upstream is unavailable. Expiry is the only way an entry leaves the store;
//! there is no invalidation API and nothing is persisted.

mod fallback;
mod fetch;
mod flight;
mod store;
mod sweeper;

pub use fallback::{fetch_resilient, recover, FallbackError};
pub use fetch::{fetch_cached, CacheKey};
pub use flight::SingleFlight;
pub use store::TtlCache;
pub use sweeper::{SweeperHandle, DEFAULT_SWEEP_INTERVAL};
