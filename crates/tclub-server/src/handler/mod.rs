//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! ```rust,ignore
//! use tclub_server::handler::routes;
//! use tclub_server::middleware::{OpenApiConfig, RouterOpenApiExt};
//! use tclub_server::service::{ServiceConfig, ServiceState};
//!
//! let state = ServiceState::from_config(&config).await?;
//! let app = routes(state.clone())
//!     .with_open_api(OpenApiConfig::default())
//!     .with_state(state);
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod accounts;
mod error;
pub mod request;
pub mod response;

use aide::axum::ApiRouter;
use axum::http::Uri;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

/// Answers every unmatched route with a JSON `404`.
async fn fallback(uri: Uri) -> Response {
    ErrorKind::NotFound
        .with_context(format!("no route for {}", uri.path()))
        .into_response()
}

/// Returns an [`ApiRouter`] with all routes.
pub fn routes(state: ServiceState) -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(accounts::routes(state))
        .fallback(fallback)
}
