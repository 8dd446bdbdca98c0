//! Middleware for `axum::Router` and HTTP request processing.
//!
//! Layers are applied through extension traits, outermost first:
//!
//! ```rust,ignore
//! use axum::Router;
//! use tclub_server::middleware::{
//!     CorsConfig, RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt,
//! };
//!
//! let app = Router::new()
//!     .with_security(&CorsConfig::default())
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! ```
//!
//! Axum wraps every later `.layer` call around the earlier ones, so the
//! recovery layer added last sees every request first.

mod authentication;
mod observability;
mod recovery;
mod security;
mod specification;

pub use authentication::{RouterAuthExt, require_authentication};
pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{CorsConfig, RouterSecurityExt};
pub use specification::{OpenApiConfig, RouterOpenApiExt};
