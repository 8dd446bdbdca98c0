//! Account handlers for registration, availability checks and lookups.
//!
//! Registration and availability checks are public. Reading the current
//! account and looking accounts up require a valid access token and are
//! not implemented yet.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::{AuthState, Json, Path, ValidateJson};
use crate::handler::request::{AccountKeyPathParams, ConfirmPathParams, CreateAccount};
use crate::handler::response::{AccountCreated, AccountTokens, Availability, ErrorResponse};
use crate::handler::{ErrorKind, Result};
use crate::middleware::RouterAuthExt;
use crate::service::{AccountWorkflow, CookieConfig, ServiceState};

/// Tracing target for account operations.
const TRACING_TARGET: &str = "tclub_server::handler::accounts";

/// Checks whether a username or email address is still free.
#[tracing::instrument(skip_all, fields(key = %path_params.key))]
async fn check_availability(
    State(account_workflow): State<AccountWorkflow>,
    Path(path_params): Path<AccountKeyPathParams>,
) -> Result<(StatusCode, Json<Availability>)> {
    tracing::trace!(target: TRACING_TARGET, "checking availability");

    account_workflow
        .check_availability(&path_params.key, &path_params.value)
        .await?;

    tracing::debug!(target: TRACING_TARGET, "value is available");
    Ok((StatusCode::OK, Json(Availability::AVAILABLE)))
}

fn check_availability_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Check availability")
        .description(
            "Returns `200` when no account uses the value for `username` or `email`, \
             `409` when it is taken.",
        )
        .response::<200, Json<Availability>>()
        .response::<400, Json<ErrorResponse<'static>>>()
        .response::<409, Json<ErrorResponse<'static>>>()
}

/// Confirms an email address.
#[tracing::instrument(skip_all, fields(confirm_id = %path_params.confirm_id))]
async fn confirm_email(Path(path_params): Path<ConfirmPathParams>) -> Result<StatusCode> {
    tracing::trace!(target: TRACING_TARGET, "email confirmation requested");

    Err(ErrorKind::NotImplemented
        .with_message("Email confirmation is not available yet")
        .with_resource("account"))
}

fn confirm_email_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Confirm email address")
        .description("Not implemented yet.")
        .response::<501, Json<ErrorResponse<'static>>>()
}

/// Creates an account and opens its first session.
#[tracing::instrument(skip_all, fields(username = %request.username))]
async fn create_account(
    State(account_workflow): State<AccountWorkflow>,
    State(cookie_config): State<CookieConfig>,
    ValidateJson(request): ValidateJson<CreateAccount>,
) -> Result<AccountCreated> {
    tracing::trace!(target: TRACING_TARGET, "creating account");

    let created = account_workflow
        .create_account(request.into_registration())
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        account_id = %created.account_id,
        "account created"
    );

    Ok(AccountCreated::new(created, &cookie_config))
}

fn create_account_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create account")
        .description(
            "Registers an account and returns an access token and a refresh token. \
             The refresh token is also set as the `refresh_token` cookie.",
        )
        .response::<201, Json<AccountTokens>>()
        .response::<400, Json<ErrorResponse<'static>>>()
        .response::<409, Json<ErrorResponse<'static>>>()
}

/// Returns the authenticated account.
#[tracing::instrument(skip_all, fields(account_id = %auth_state.account_id))]
async fn get_current_account(auth_state: AuthState) -> Result<StatusCode> {
    tracing::trace!(target: TRACING_TARGET, "current account requested");

    Err(ErrorKind::NotImplemented
        .with_message("Reading the current account is not available yet")
        .with_resource("account"))
}

fn get_current_account_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get current account")
        .description("Not implemented yet. Requires a bearer access token.")
        .response::<400, Json<ErrorResponse<'static>>>()
        .response::<401, Json<ErrorResponse<'static>>>()
        .response::<501, Json<ErrorResponse<'static>>>()
}

/// Looks an account up by username or email address.
#[tracing::instrument(
    skip_all,
    fields(account_id = %auth_state.account_id, key = %path_params.key)
)]
async fn find_account(
    auth_state: AuthState,
    Path(path_params): Path<AccountKeyPathParams>,
) -> Result<StatusCode> {
    tracing::trace!(target: TRACING_TARGET, "account lookup requested");

    Err(ErrorKind::NotImplemented
        .with_message("Account lookup is not available yet")
        .with_resource("account"))
}

fn find_account_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Find account")
        .description("Not implemented yet. Requires a bearer access token.")
        .response::<400, Json<ErrorResponse<'static>>>()
        .response::<401, Json<ErrorResponse<'static>>>()
        .response::<501, Json<ErrorResponse<'static>>>()
}

/// Returns routes for account management.
pub fn routes(state: ServiceState) -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    let public_routes = ApiRouter::new()
        .api_route(
            "/v1/account/availability/{key}/{value}",
            get_with(check_availability, check_availability_docs),
        )
        .api_route(
            "/v1/account/confirm/{confirmId}",
            get_with(confirm_email, confirm_email_docs),
        )
        .api_route(
            "/v1/account/",
            post_with(create_account, create_account_docs),
        );

    let private_routes = ApiRouter::new()
        .api_route(
            "/v1/account/",
            get_with(get_current_account, get_current_account_docs),
        )
        .api_route(
            "/v1/account/{key}/{value}",
            get_with(find_account, find_account_docs),
        )
        .with_authentication(state);

    public_routes
        .merge(private_routes)
        .with_path_items(|item| item.tag("Accounts"))
}

#[cfg(test)]
mod tests {
    use axum::http::header::{AUTHORIZATION, SET_COOKIE};
    use axum::http::{HeaderValue, StatusCode};
    use serde_json::json;

    use std::sync::Arc;

    use tclub_mongo::query::memory_account_store;
    use tclub_redis::{MemoryCache, RefreshTokenStore};

    use crate::handler::response::AccountTokens;
    use crate::handler::test::{
        UnavailableCache, UnavailableStore, create_test_server, create_test_server_with,
        create_test_state_with,
    };

    fn alice() -> serde_json::Value {
        json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret1",
        })
    }

    fn bearer(token: &str) -> anyhow::Result<HeaderValue> {
        Ok(HeaderValue::from_str(&format!("Bearer {token}"))?)
    }

    #[tokio::test]
    async fn create_account_returns_tokens_and_cookie() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server.post("/v1/account/").json(&alice()).await;
        response.assert_status(StatusCode::CREATED);

        let tokens: AccountTokens = response.json();
        assert_eq!(tokens.id.len(), 24);
        assert!(!tokens.access_token.is_empty());
        assert_ne!(tokens.access_token, tokens.refresh_token);

        let cookie = response.header(SET_COOKIE);
        let cookie = cookie.to_str()?;
        assert!(cookie.starts_with(&format!("refresh_token={}", tokens.refresh_token)));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Domain=tclub.test"));
        assert!(cookie.contains("Max-Age=604800"));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() -> anyhow::Result<()> {
        let server = create_test_server()?;
        server
            .post("/v1/account/")
            .json(&alice())
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/v1/account/")
            .json(&json!({
                "username": "alice2",
                "email": "alice@example.com",
                "password": "secret1",
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "conflict");
        assert_eq!(body["message"], "email is already taken");
        Ok(())
    }

    #[tokio::test]
    async fn invalid_body_is_bad_request() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .post("/v1/account/")
            .json(&json!({
                "username": ".alice",
                "email": "email@[123.123.123.123]",
                "password": "12345",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: serde_json::Value = response.json();
        assert_eq!(body["validation"].as_array().map(Vec::len), Some(3));
        Ok(())
    }

    #[tokio::test]
    async fn availability_flips_after_creation() -> anyhow::Result<()> {
        let server = create_test_server()?;

        for _ in 0..2 {
            let response = server.get("/v1/account/availability/username/alice").await;
            response.assert_status_ok();
            response.assert_json(&json!({ "available": true }));
        }

        server
            .post("/v1/account/")
            .json(&alice())
            .await
            .assert_status(StatusCode::CREATED);

        server
            .get("/v1/account/availability/username/alice")
            .await
            .assert_status(StatusCode::CONFLICT);
        server
            .get("/v1/account/availability/email/alice@example.com")
            .await
            .assert_status(StatusCode::CONFLICT);
        Ok(())
    }

    #[tokio::test]
    async fn availability_rejects_bad_key_and_value() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server.get("/v1/account/availability/phone/12345").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "invalid key, expected 'username' or 'email'");

        server
            .get("/v1/account/availability/email/not-an-email")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn confirm_is_not_implemented() -> anyhow::Result<()> {
        let server = create_test_server()?;
        server
            .get("/v1/account/confirm/abc123")
            .await
            .assert_status(StatusCode::NOT_IMPLEMENTED);
        Ok(())
    }

    #[tokio::test]
    async fn private_routes_require_a_valid_token() -> anyhow::Result<()> {
        let server = create_test_server()?;

        server
            .get("/v1/account/")
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .get("/v1/account/")
            .add_header(AUTHORIZATION, HeaderValue::from_static("Bear"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .get("/v1/account/")
            .add_header(AUTHORIZATION, bearer("not-a-token")?)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let created = server.post("/v1/account/").json(&alice()).await;
        let tokens: AccountTokens = created.json();

        server
            .get("/v1/account/")
            .add_header(AUTHORIZATION, bearer(&tokens.refresh_token)?)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .get("/v1/account/")
            .add_header(AUTHORIZATION, bearer(&tokens.access_token)?)
            .await
            .assert_status(StatusCode::NOT_IMPLEMENTED);

        server
            .get("/v1/account/username/alice")
            .add_header(AUTHORIZATION, bearer(&tokens.access_token)?)
            .await
            .assert_status(StatusCode::NOT_IMPLEMENTED);
        Ok(())
    }

    #[tokio::test]
    async fn store_timeout_is_internal_error() -> anyhow::Result<()> {
        let state = create_test_state_with(
            Arc::new(UnavailableStore),
            RefreshTokenStore::new(MemoryCache::new()),
        )?;
        let server = create_test_server_with(state)?;

        let response = server.post("/v1/account/").json(&alice()).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "internal_server_error");

        server
            .get("/v1/account/availability/username/alice")
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }

    #[tokio::test]
    async fn cache_timeout_after_insert_is_internal_error() -> anyhow::Result<()> {
        let state = create_test_state_with(
            memory_account_store(),
            RefreshTokenStore::new(UnavailableCache),
        )?;
        let server = create_test_server_with(state)?;

        let response = server.post("/v1/account/").json(&alice()).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.maybe_header(SET_COOKIE).is_none());

        server
            .get("/v1/account/availability/username/alice")
            .await
            .assert_status(StatusCode::CONFLICT);
        Ok(())
    }
}
