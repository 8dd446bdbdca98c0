//! Access token extraction from the `Authorization` header.
//!
//! The header value must be at least as long as the `Bearer ` scheme prefix.
//! The prefix is stripped without inspecting it, and a token wrapped in
//! double quotes is unquoted with JSON string rules before verification.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::handler::{Error, ErrorKind, Result};
use crate::service::{TokenClaims, TokenService};
use crate::utility::tracing_targets::TRACING_TARGET_AUTHENTICATION as TRACING_TARGET;

/// Length of the `Bearer ` scheme prefix.
const SCHEME_PREFIX_LEN: usize = 7;

/// Verified access token taken from the `Authorization` header.
///
/// Extraction is cached in the request extensions, so later extractors in
/// the same request reuse the verified claims.
#[must_use]
#[derive(Debug, Clone)]
pub struct AuthHeader {
    token_claims: TokenClaims,
}

impl AuthHeader {
    /// Wraps already verified claims.
    #[inline]
    pub const fn new(token_claims: TokenClaims) -> Self {
        Self { token_claims }
    }

    /// Returns the verified claims.
    #[inline]
    pub const fn as_token_claims(&self) -> &TokenClaims {
        &self.token_claims
    }

    /// Consumes the header, returning the verified claims.
    #[inline]
    pub fn into_token_claims(self) -> TokenClaims {
        self.token_claims
    }

    /// Verifies a raw `Authorization` header value.
    pub fn from_header_value(header_value: &str, token_service: &TokenService) -> Result<Self> {
        let token = extract_token(header_value)?;

        let token_claims = token_service.verify_access_token(&token).map_err(|error| {
            tracing::debug!(
                target: TRACING_TARGET,
                error = %error,
                "Access token rejected"
            );

            ErrorKind::Unauthorized
                .with_message("Invalid or expired access token")
                .with_context(error.to_string())
                .with_resource("authentication")
                .into_static()
        })?;

        Ok(Self::new(token_claims))
    }
}

/// Strips the scheme prefix and unquotes the token when needed.
fn extract_token(header_value: &str) -> Result<String> {
    let token = header_value
        .get(SCHEME_PREFIX_LEN..)
        .ok_or_else(malformed_header)?;

    if !token.starts_with('"') {
        return Ok(token.to_owned());
    }

    serde_json::from_str::<String>(token).map_err(|error| {
        ErrorKind::Unauthorized
            .with_message("Invalid or expired access token")
            .with_context(format!("quoted token is not a valid string: {error}"))
            .with_resource("authentication")
            .into_static()
    })
}

fn malformed_header() -> Error<'static> {
    ErrorKind::MalformedAuthHeader
        .with_message("Malformed Authorization header")
        .with_context("Authorization header must carry a bearer token")
        .with_resource("authentication")
}

impl<S> FromRequestParts<S> for AuthHeader
where
    S: Sync + Send,
    TokenService: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth_header) = parts.extensions.get::<Self>() {
            return Ok(auth_header.clone());
        }

        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(malformed_header)?;

        let token_service = TokenService::from_ref(state);
        let auth_header = Self::from_header_value(header_value, &token_service)?;

        tracing::trace!(
            target: TRACING_TARGET,
            account_id = %auth_header.token_claims.account_id,
            "Access token verified"
        );

        parts.extensions.insert(auth_header.clone());
        Ok(auth_header)
    }
}

impl aide::OperationInput for AuthHeader {}
