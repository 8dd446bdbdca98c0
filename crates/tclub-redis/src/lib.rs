#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for client initialization and connectivity.
pub const TRACING_TARGET_CLIENT: &str = "tclub_redis::client";

/// Tracing target for cache reads and writes.
///
/// Use this target for logging cache operations, expirations, and cache-related errors.
pub const TRACING_TARGET_CACHE: &str = "tclub_redis::cache";

mod cache;
mod client;
mod error;

pub use crate::cache::{MemoryCache, RedisCache, RefreshTokenStore, SessionCache};
pub use crate::client::{RedisClient, RedisConfig};
pub use crate::error::{CacheError, CacheResult};
