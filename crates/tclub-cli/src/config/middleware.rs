//! Middleware configuration for the HTTP server.
//!
//! All middleware configs are re-exported from `tclub-server` and support
//! both CLI arguments and environment variables.
//!
//! ```bash
//! tclub --cors-origins "https://tclub.example" --request-timeout 60
//! ```

use anyhow::{Result as AnyhowResult, bail};
use clap::Args;
use serde::{Deserialize, Serialize};
use tclub_server::middleware::{CorsConfig, OpenApiConfig, RecoveryConfig};

use crate::TRACING_TARGET_CONFIG;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Middleware configuration combining CORS, OpenAPI, and recovery settings.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// CORS (Cross-Origin Resource Sharing) configuration.
    #[clap(flatten)]
    pub cors: CorsConfig,

    /// Paths of the OpenAPI document and the Scalar UI.
    #[clap(flatten)]
    pub openapi: OpenApiConfig,

    /// Request timeout and panic recovery.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,
}

impl MiddlewareConfig {
    /// Validates middleware settings.
    ///
    /// Origins are matched literally, so a `*` entry would never match any
    /// request and is rejected outright.
    pub fn validate(&self) -> AnyhowResult<()> {
        let timeout = self.recovery.request_timeout;
        if timeout == 0 || timeout > MAX_REQUEST_TIMEOUT_SECS {
            bail!(
                "Request timeout {timeout} seconds is invalid. Must be between 1 and {MAX_REQUEST_TIMEOUT_SECS} seconds."
            );
        }

        if self.cors.allowed_origins.iter().any(|o| o.trim() == "*") {
            bail!("Wildcard CORS origin is not supported, list each allowed origin explicitly");
        }

        Ok(())
    }

    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            origins = ?self.cors.allowed_origins,
            credentials = self.cors.allow_credentials,
            "CORS configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            openapi_path = %self.openapi.open_api_json,
            scalar_path = %self.openapi.scalar_ui,
            "OpenAPI configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.recovery.request_timeout,
            "Recovery configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(MiddlewareConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_timeouts() {
        let mut config = MiddlewareConfig::default();

        config.recovery = RecoveryConfig::with_timeout_secs(0);
        assert!(config.validate().is_err());

        config.recovery = RecoveryConfig::with_timeout_secs(301);
        assert!(config.validate().is_err());

        config.recovery = RecoveryConfig::with_timeout_secs(60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_wildcard_origin() {
        let mut config = MiddlewareConfig {
            cors: CorsConfig::with_origins(["https://tclub.example", " * "]),
            ..MiddlewareConfig::default()
        };
        assert!(config.validate().is_err());

        config.cors.allow_credentials = false;
        assert!(config.validate().is_err());

        config.cors = CorsConfig::with_origins(["https://tclub.example"]);
        assert!(config.validate().is_ok());
    }
}
