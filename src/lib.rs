//! courtside library
//!
//! A caching gateway in front of slow, rate-limited basketball statistics
//! providers. Every read goes through an in-memory TTL cache, and most fall back
//! to synthetic data of the same shape when the provider is unavailable.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod gateway;
pub mod upstream;

pub use gateway::{GatewayError, StatsGateway};
