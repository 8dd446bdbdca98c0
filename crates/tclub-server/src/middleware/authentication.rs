//! Authentication middleware for validating request credentials.

use aide::axum::ApiRouter;
use axum::extract::Request;
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;

use crate::extract::AuthState;
use crate::service::ServiceState;
use crate::utility::tracing_targets::TRACING_TARGET_AUTHENTICATION as TRACING_TARGET;

/// Extension trait for [`ApiRouter`] to require authentication.
pub trait RouterAuthExt {
    /// Requires a valid access token for every route already on the router.
    ///
    /// Implemented as a route layer, so unmatched paths still fall through
    /// to the fallback handler instead of failing authentication.
    fn with_authentication(self, state: ServiceState) -> Self;
}

impl RouterAuthExt for ApiRouter<ServiceState> {
    fn with_authentication(self, state: ServiceState) -> Self {
        self.route_layer(from_fn_with_state(state, require_authentication))
    }
}

/// Requires a valid access token to proceed with the request.
///
/// A missing or too short `Authorization` header is rejected with
/// `400 Bad Request`, an invalid or expired token with `401 Unauthorized`.
/// The verified [`AuthState`] stays in the request extensions for handlers.
pub async fn require_authentication(
    AuthState(token_claims): AuthState,
    request: Request,
    next: Next,
) -> Response {
    tracing::trace!(
        target: TRACING_TARGET,
        account_id = %token_claims.account_id,
        "request authenticated"
    );

    next.run(request).await
}
