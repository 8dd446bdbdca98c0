//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig         # Host, port, shutdown, environment
//! ├── middleware: MiddlewareConfig # CORS, OpenAPI, request timeout
//! └── service: ServiceConfig       # MongoDB, Redis, tokens, cookie domain
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//!
//! ```bash
//! tclub --mongo-uri "mongodb://localhost:27017" --port 8080
//! MONGO_URI="mongodb://localhost:27017" PORT=8080 tclub
//! ```

mod middleware;
mod server;

use std::process;

use anyhow::Context;
use clap::Parser;
pub use middleware::MiddlewareConfig;
use serde::{Deserialize, Serialize};
pub use server::{ServerConfig, ServerEnv};
use tclub_server::service::ServiceConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "tclub")]
#[command(about = "tclub account server")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (CORS, OpenAPI, timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Account store, session cache and token configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads `.env` (if enabled) and parses CLI arguments.
    ///
    /// `.env` must be loaded first so clap's `env` fallbacks can see it.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Output is human-readable in the debug environment and JSON in release.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        match self.server.server_env {
            ServerEnv::Release => registry
                .with(tracing_subscriber::fmt::layer().json())
                .init(),
            ServerEnv::Debug => registry.with(tracing_subscriber::fmt::layer()).init(),
        }
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.middleware
            .validate()
            .context("invalid middleware configuration")?;
        self.service
            .validate()
            .context("invalid service configuration")?;
        Ok(())
    }

    /// Logs configuration (no secrets).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            "starting tclub server"
        );

        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "build information"
        );

        self.server.log();
        self.middleware.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            mongo_database = %self.service.mongo_config.mongo_database,
            redis_address = %self.service.redis_config.redis_address,
            redis_database = self.service.redis_config.redis_database,
            access_token_ttl_mins = self.service.token_config.access_token_ttl,
            refresh_token_ttl_mins = self.service.token_config.refresh_token_ttl,
            cookie_domain = %self.service.cookie_config.server_domain,
            "Service configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 5] = [
        "tclub",
        "--access-token-secret",
        "access",
        "--refresh-token-secret",
        "refresh",
    ];

    #[test]
    fn parses_with_defaults() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(REQUIRED)?;
        assert_eq!(cli.server.port, 8080);
        assert_eq!(cli.server.server_env, ServerEnv::Debug);
        assert_eq!(cli.middleware.recovery.request_timeout, 30);
        assert_eq!(cli.service.cookie_config.server_domain, "localhost");
        cli.validate()?;
        Ok(())
    }

    #[test]
    fn parses_release_environment() -> anyhow::Result<()> {
        let args = REQUIRED
            .into_iter()
            .chain(["--server-env", "release", "--port", "9000"]);
        let cli = Cli::try_parse_from(args)?;
        assert_eq!(cli.server.server_env, ServerEnv::Release);
        assert_eq!(cli.server.port, 9000);
        Ok(())
    }

    #[test]
    fn rejects_unknown_environment() {
        let args = REQUIRED.into_iter().chain(["--server-env", "staging"]);
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn shared_token_secrets_fail_validation() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "tclub",
            "--access-token-secret",
            "same",
            "--refresh-token-secret",
            "same",
        ])?;
        assert!(cli.validate().is_err());
        Ok(())
    }
}
