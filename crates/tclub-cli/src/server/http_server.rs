//! HTTP server startup.

use std::future::IntoFuture;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::TRACING_TARGET_SERVER_STARTUP as TRACING_TARGET;
use crate::config::ServerConfig;
use crate::server::lifecycle::serve_with_shutdown;
use crate::server::{ServerError, ServerResult, shutdown_signal};

/// Binds the configured address and serves `app` until a shutdown signal.
///
/// After the signal, in-flight requests get `shutdown_timeout` to finish
/// before the server stops waiting for them.
pub async fn serve_http(app: Router, server_config: ServerConfig) -> ServerResult<()> {
    server_config
        .validate()
        .map_err(|err| ServerError::invalid_config(&err))?;

    let server_addr = server_config.server_addr();
    let listener = TcpListener::bind(server_addr).await.map_err(|source| {
        tracing::error!(
            target: TRACING_TARGET,
            addr = %server_addr,
            error = %source,
            "Failed to bind to address"
        );
        ServerError::Bind {
            address: server_addr.to_string(),
            source,
        }
    })?;

    let shutdown_timeout = server_config.shutdown_timeout();
    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let signal = async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    };

    serve_with_shutdown(&server_config, || async move {
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal);

        let deadline = async move {
            if signalled_rx.await.is_ok() {
                tokio::time::sleep(shutdown_timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = server.into_future() => result,
            () = deadline => {
                tracing::warn!(
                    target: crate::TRACING_TARGET_SERVER_SHUTDOWN,
                    timeout_secs = shutdown_timeout.as_secs(),
                    "Graceful shutdown timed out, dropping open connections"
                );
                Ok(())
            }
        }
    })
    .await
}
