//! Centralized tracing target constants for structured logging.
//!
//! Using consistent targets enables fine-grained control over log output
//! via tracing subscriber filters.

/// Bearer token extraction and validation.
pub const TRACING_TARGET_AUTHENTICATION: &str = "tclub_server::authentication";

/// Account workflow operations such as registration and availability checks.
pub const TRACING_TARGET_ACCOUNT: &str = "tclub_server::account";

/// Error recovery including middleware errors and request failures.
pub const TRACING_TARGET_RECOVERY_ERROR: &str = "tclub_server::recovery::error";

/// Panic recovery including handler panics.
pub const TRACING_TARGET_RECOVERY_PANIC: &str = "tclub_server::recovery::panic";

/// Password hashing and verification operations.
pub const TRACING_TARGET_PASSWORD_HASHER: &str = "tclub_server::password_hasher";

/// Token signing and verification.
pub const TRACING_TARGET_TOKEN_SERVICE: &str = "tclub_server::token_service";

/// Service state construction and backing store connections.
pub const TRACING_TARGET_SERVICE: &str = "tclub_server::service";

/// Document store failures surfaced to HTTP handlers.
pub const TRACING_TARGET_STORE: &str = "tclub_server::store";

/// Session cache failures surfaced to HTTP handlers.
pub const TRACING_TARGET_CACHE: &str = "tclub_server::cache";
