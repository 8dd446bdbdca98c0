#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for client-related operations.
///
/// Use this target for logging client initialization, configuration, and lifecycle events.
pub const TRACING_TARGET_CLIENT: &str = "tclub_mongo::client";

/// Tracing target for document store operations.
///
/// Use this target for logging query execution, results, and query-related errors.
pub const TRACING_TARGET_QUERY: &str = "tclub_mongo::queries";

/// Tracing target for database connection operations.
pub const TRACING_TARGET_CONNECTION: &str = "tclub_mongo::connection";

mod client;
mod error;
pub mod model;
pub mod query;
pub mod store;

pub use mongodb::bson;

pub use crate::client::{MongoClient, MongoConfig};
pub use crate::error::{MongoError, MongoResult};
pub use crate::store::{DocumentStore, Filter, MemoryStore, MongoStore, Patch};
