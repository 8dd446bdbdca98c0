//! Cross-origin request policy.

use std::time::Duration;

use axum::Router;
use axum::http::Method;
use axum::http::header::{self, HeaderName, HeaderValue};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

/// Header used by browser clients to echo the XSRF cookie.
const X_XSRF_TOKEN: HeaderName = HeaderName::from_static("x-xsrf-token");

/// Header set by XMLHttpRequest based clients.
const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// Extension trait for `axum::`[`Router`] to apply security middleware.
pub trait RouterSecurityExt<S> {
    /// Layers the CORS policy with the provided configuration.
    ///
    /// Credentials are allowed for the configured origins, so the refresh
    /// token cookie can travel with cross-origin requests.
    fn with_security(self, cors: &CorsConfig) -> Self;

    /// Layers the CORS policy for local development origins.
    fn with_default_security(self) -> Self;
}

impl<S> RouterSecurityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_security(self, cors: &CorsConfig) -> Self {
        let cors_layer = CorsLayer::new()
            .allow_origin(cors.to_header_values())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                X_XSRF_TOKEN,
                header::ACCEPT,
                header::ORIGIN,
                X_REQUESTED_WITH,
                header::AUTHORIZATION,
                header::SET_COOKIE,
            ])
            .allow_credentials(cors.allow_credentials)
            .max_age(cors.max_age());

        self.layer(cors_layer)
    }

    fn with_default_security(self) -> Self {
        self.with_security(&CorsConfig::default())
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct CorsConfig {
    /// List of allowed CORS origins.
    ///
    /// If empty, defaults to localhost origins for development.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_ORIGINS", value_delimiter = ',')
    )]
    pub allowed_origins: Vec<String>,

    /// Maximum age for CORS preflight requests in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_MAX_AGE", default_value = "3600")
    )]
    pub max_age_seconds: u64,

    /// Whether to allow credentials in CORS requests.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_ALLOW_CREDENTIALS", default_value = "true")
    )]
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_seconds: 3600,
            allow_credentials: true,
        }
    }
}

impl CorsConfig {
    /// Creates a configuration allowing the given origins.
    pub fn with_origins<I, T>(origins: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Returns the CORS max age as a Duration.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    /// Converts configured origins to HeaderValue list, falling back to localhost for development.
    ///
    /// Origins that are not valid header values are skipped.
    pub fn to_header_values(&self) -> Vec<HeaderValue> {
        if self.allowed_origins.is_empty() {
            return vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://localhost:8080"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
                HeaderValue::from_static("http://127.0.0.1:8080"),
                HeaderValue::from_static("http://localhost:5173"),
            ];
        }

        self.allowed_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| origin.parse().ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::get;
    use axum_test::TestServer;

    use super::*;

    #[test]
    fn localhost_origins_by_default() {
        let origins = CorsConfig::default().to_header_values();
        assert_eq!(origins.len(), 5);
    }

    #[test]
    fn custom_origins_are_trimmed() {
        let config = CorsConfig::with_origins(["https://tclub.app", " https://admin.tclub.app", ""]);
        let origins = config.to_header_values();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[1], "https://admin.tclub.app");
    }

    #[tokio::test]
    async fn allowed_origin_receives_credentials_header() -> anyhow::Result<()> {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .with_security(&CorsConfig::with_origins(["https://tclub.app"]));
        let server = TestServer::new(app)?;

        let response = server
            .get("/")
            .add_header(header::ORIGIN, HeaderValue::from_static("https://tclub.app"))
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            "https://tclub.app"
        );
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            "true"
        );
        Ok(())
    }
}
