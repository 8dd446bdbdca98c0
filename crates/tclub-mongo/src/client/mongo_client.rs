use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};

use crate::{MongoConfig, MongoError, MongoResult, TRACING_TARGET_CONNECTION};

/// High-level document database client.
///
/// Cheap to clone; all clones share the underlying driver connection pool.
#[derive(Clone)]
pub struct MongoClient {
    inner: Arc<MongoClientInner>,
}

/// Inner data for MongoClient
struct MongoClientInner {
    client: Client,
    database: Database,
    config: MongoConfig,
}

impl MongoClient {
    /// Connects to the server described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    ///
    /// - The configuration is invalid
    /// - The connection string cannot be parsed
    /// - The server does not answer a ping within the operation timeout
    #[tracing::instrument(
        skip(config),
        target = TRACING_TARGET_CONNECTION,
        fields(uri = %config.uri_masked(), database = %config.mongo_database)
    )]
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        config.validate()?;
        tracing::info!(target: TRACING_TARGET_CONNECTION, "Initializing database client");

        let mut options = ClientOptions::parse(config.uri())
            .await
            .map_err(|e| MongoError::Config(format!("invalid connection string: {e}")))?;

        if let Some(credential) = options.credential.as_mut()
            && credential.source.is_none()
        {
            credential.source = Some(config.mongo_auth_source.clone());
        }

        options.app_name = Some(env!("CARGO_PKG_NAME").to_owned());
        options.server_selection_timeout = Some(config.operation_timeout());

        let client = Client::with_options(options).map_err(MongoError::Connection)?;
        let database = client.database(&config.mongo_database);

        let this = Self {
            inner: Arc::new(MongoClientInner {
                client,
                database,
                config,
            }),
        };

        this.ping().await.inspect_err(|e| {
            tracing::error!(target: TRACING_TARGET_CONNECTION, error = %e, "Database connectivity test failed");
        })?;

        tracing::info!(target: TRACING_TARGET_CONNECTION, "Database client initialized");
        Ok(this)
    }

    /// Sends a `ping` command to the server, bounded by the operation timeout.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CONNECTION)]
    pub async fn ping(&self) -> MongoResult<()> {
        let admin = self.inner.client.database("admin");
        let timeout = self.operation_timeout();

        tokio::time::timeout(timeout, admin.run_command(doc! { "ping": 1 }))
            .await
            .map_err(|_| MongoError::Timeout {
                operation: "ping",
                timeout,
            })?
            .map_err(MongoError::Connection)?;

        tracing::debug!(target: TRACING_TARGET_CONNECTION, "Database ping succeeded");
        Ok(())
    }

    /// Returns a typed handle to a collection of the configured database.
    #[inline]
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.inner.database.collection(name)
    }

    /// Returns the configured database.
    #[inline]
    pub fn database(&self) -> &Database {
        &self.inner.database
    }

    /// Returns the configuration used by this client.
    #[inline]
    pub fn config(&self) -> &MongoConfig {
        &self.inner.config
    }

    /// Returns the per-operation timeout.
    #[inline]
    pub fn operation_timeout(&self) -> Duration {
        self.inner.config.operation_timeout()
    }
}

impl fmt::Debug for MongoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
