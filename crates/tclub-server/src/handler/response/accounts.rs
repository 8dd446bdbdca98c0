//! Account response types.

use aide::OperationOutput;
use aide::generate::GenContext;
use aide::openapi::{Operation, Response as ApiResponse};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::service::{CookieConfig, CreatedAccount, REFRESH_TOKEN_COOKIE};

/// Result of an availability check.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    /// Always `true`; a taken value is reported as `409 Conflict`.
    pub available: bool,
}

impl Availability {
    /// Reports the value as available.
    pub const AVAILABLE: Self = Self { available: true };
}

/// Body returned after a successful registration.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountTokens {
    /// Identifier of the new account.
    pub id: String,
    /// Short-lived token for the `Authorization` header.
    pub access_token: String,
    /// Long-lived token, also set as the `refresh_token` cookie.
    pub refresh_token: String,
}

/// `201 Created` response carrying the tokens and the refresh cookie.
#[must_use]
#[derive(Debug)]
pub struct AccountCreated {
    body: AccountTokens,
    cookie: Cookie<'static>,
}

impl AccountCreated {
    /// Builds the response for a newly created account.
    ///
    /// The cookie is `Secure`, `HttpOnly`, `SameSite=None`, scoped to `/` on
    /// the configured domain and expires together with the refresh token.
    pub fn new(created: CreatedAccount, cookie_config: &CookieConfig) -> Self {
        let max_age = time::Duration::try_from(created.refresh_token_ttl)
            .unwrap_or(time::Duration::MAX);

        let cookie = Cookie::build((REFRESH_TOKEN_COOKIE, created.refresh_token.clone()))
            .domain(cookie_config.server_domain.clone())
            .path("/")
            .max_age(max_age)
            .secure(true)
            .http_only(true)
            .same_site(SameSite::None)
            .build();

        let body = AccountTokens {
            id: created.account_id,
            access_token: created.access_token,
            refresh_token: created.refresh_token,
        };

        Self { body, cookie }
    }

    /// Returns the response body.
    #[inline]
    pub fn body(&self) -> &AccountTokens {
        &self.body
    }

    /// Returns the refresh token cookie.
    #[inline]
    pub fn cookie(&self) -> &Cookie<'static> {
        &self.cookie
    }
}

impl IntoResponse for AccountCreated {
    fn into_response(self) -> Response {
        let jar = CookieJar::new().add(self.cookie);
        (StatusCode::CREATED, jar, Json(self.body)).into_response()
    }
}

impl OperationOutput for AccountCreated {
    type Inner = AccountTokens;

    fn operation_response(
        ctx: &mut GenContext,
        operation: &mut Operation,
    ) -> Option<ApiResponse> {
        Json::<AccountTokens>::operation_response(ctx, operation)
    }

    fn inferred_responses(
        ctx: &mut GenContext,
        operation: &mut Operation,
    ) -> Vec<(Option<u16>, ApiResponse)> {
        Self::operation_response(ctx, operation)
            .map(|response| vec![(Some(StatusCode::CREATED.as_u16()), response)])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::header::SET_COOKIE;

    use super::*;

    fn created() -> CreatedAccount {
        CreatedAccount {
            account_id: "65f1c0ffee".to_owned(),
            access_token: "access".to_owned(),
            refresh_token: "refresh".to_owned(),
            refresh_token_ttl: Duration::from_secs(604_800),
        }
    }

    #[test]
    fn cookie_attributes() {
        let response = AccountCreated::new(created(), &CookieConfig::new("tclub.test"));
        let cookie = response.cookie();

        assert_eq!(cookie.name(), "refresh_token");
        assert_eq!(cookie.value(), "refresh");
        assert_eq!(cookie.domain(), Some("tclub.test"));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604_800)));
        assert_eq!(response.body().id, "65f1c0ffee");
    }

    #[test]
    fn response_is_created_with_cookie() {
        let response =
            AccountCreated::new(created(), &CookieConfig::new("tclub.test")).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().contains_key(SET_COOKIE));
    }

    #[test]
    fn availability_body() -> anyhow::Result<()> {
        let body = serde_json::to_value(Availability::AVAILABLE)?;
        assert_eq!(body, serde_json::json!({ "available": true }));
        Ok(())
    }
}
