//! Authenticated request state.

use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use derive_more::Deref;

use super::AuthHeader;
use crate::handler::{Error, Result};
use crate::service::{TokenClaims, TokenService};

/// Claims of the access token that authenticated the request.
///
/// Dereferences to [`TokenClaims`]. Verification happens in [`AuthHeader`];
/// the state itself is cached in the request extensions.
#[derive(Debug, Clone, Deref)]
pub struct AuthState(pub TokenClaims);

impl AuthState {
    /// Returns the identifier of the authenticated account.
    #[inline]
    pub fn account_id(&self) -> &str {
        &self.0.account_id
    }
}

impl From<AuthHeader> for AuthState {
    #[inline]
    fn from(auth_header: AuthHeader) -> Self {
        Self(auth_header.into_token_claims())
    }
}

impl<S> FromRequestParts<S> for AuthState
where
    S: Sync + Send,
    TokenService: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth_state) = parts.extensions.get::<Self>() {
            return Ok(auth_state.clone());
        }

        let auth_header = AuthHeader::from_request_parts(parts, state).await?;
        let auth_state = Self::from(auth_header);
        parts.extensions.insert(auth_state.clone());
        Ok(auth_state)
    }
}

impl<S> OptionalFromRequestParts<S> for AuthState
where
    S: Sync + Send,
    TokenService: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(axum::http::header::AUTHORIZATION) {
            return Ok(None);
        }

        <Self as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}

impl aide::OperationInput for AuthState {}
