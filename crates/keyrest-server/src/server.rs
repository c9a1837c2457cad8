//! HTTP/1.1 listener built on Hyper and Tokio.
//!
//! The server owns the transport concerns: accepting connections, reading
//! bodies up to the configured limit and draining on shutdown. Everything
//! after the body is collected belongs to [`RestHandler`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http::Request;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use keyrest_core::ErrorEnvelope;
use keyrest_telemetry::metrics as telemetry;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::response::{error_response, HttpResponse};
use crate::router::{RestHandler, UNMATCHED_OPERATION};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The bind address could not be parsed.
    #[error("invalid bind address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The parsed address.
        addr: SocketAddr,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Serves a [`RestHandler`] over HTTP/1.1.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use keyrest_server::{routes, Server, ServerConfig, StatusPolicy};
///
/// let handler = routes::key_directory_routes()
///     .into_handler(Arc::new(directory), StatusPolicy::default());
///
/// Server::new(ServerConfig::default(), handler).run().await?;
/// ```
pub struct Server<S> {
    config: ServerConfig,
    handler: RestHandler<S>,
}

impl<S: Send + Sync + 'static> Server<S> {
    /// Creates a server.
    #[must_use]
    pub fn new(config: ServerConfig, handler: RestHandler<S>) -> Self {
        Self { config, handler }
    }

    /// Listener settings.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The request handler.
    #[must_use]
    pub fn handler(&self) -> &RestHandler<S> {
        &self.handler
    }

    /// Runs until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and runs until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Accepts connections on an already bound listener until `shutdown`
    /// fires, then waits up to the shutdown timeout for them to drain.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(%addr, routes = self.handler.routes().len(), "server listening"),
            Err(e) => tracing::warn!(error = %e, "server listening on unknown address"),
        }

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            server.serve_connection(stream, remote, shutdown).await;
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => break,
            }
        }

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            timeout_secs = timeout.as_secs(),
            "shutting down, draining connections"
        );
        if tokio::time::timeout(timeout, tracker.wait_for_drain())
            .await
            .is_err()
        {
            tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }
        tracing::info!("server stopped");
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote: SocketAddr,
        shutdown: ShutdownSignal,
    ) {
        let server = Arc::clone(&self);
        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request).await) }
        });

        let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        let result = tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        };
        if let Err(e) = result {
            tracing::debug!(%remote, error = %e, "connection closed with error");
        }
    }

    async fn handle_request(&self, request: Request<Incoming>) -> HttpResponse {
        let (parts, body) = request.into_parts();
        match Limited::new(body, self.config.max_body_bytes()).collect().await {
            Ok(collected) => {
                self.handler
                    .handle(Request::from_parts(parts, collected.to_bytes()))
                    .await
            }
            Err(e) => self.reject_body(parts.uri.path(), &*e),
        }
    }

    /// Answers a request whose body never made it off the connection.
    fn reject_body(&self, path: &str, error: &(dyn std::error::Error + Send + Sync + 'static)) -> HttpResponse {
        let started = Instant::now();
        let policy = self.handler.policy();
        let (status, envelope) = if error.downcast_ref::<LengthLimitError>().is_some() {
            tracing::warn!(
                http.path = path,
                limit = self.config.max_body_bytes(),
                "request body too large"
            );
            (
                policy.payload_too_large,
                ErrorEnvelope::new(
                    "PAYLOAD_TOO_LARGE",
                    format!(
                        "request body exceeds {} bytes",
                        self.config.max_body_bytes()
                    ),
                ),
            )
        } else {
            tracing::warn!(http.path = path, %error, "failed to read request body");
            (
                policy.body_read,
                ErrorEnvelope::new("BODY_READ_ERROR", format!("failed to read request body: {error}")),
            )
        };
        telemetry::record_request(UNMATCHED_OPERATION, status.as_u16(), started.elapsed());
        error_response(status, &envelope)
    }
}

impl<S> std::fmt::Debug for Server<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::StatusPolicy;
    use crate::router::RouteTable;
    use std::time::Duration;

    struct NoState;

    #[tokio::test]
    async fn test_invalid_address() {
        let config = ServerConfig::builder().http_addr("nowhere").build();
        let handler = RouteTable::<NoState>::new().into_handler(Arc::new(NoState), StatusPolicy::default());
        let err = Server::new(config, handler)
            .run_with_shutdown(ShutdownSignal::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let handler = RouteTable::<NoState>::new().into_handler(Arc::new(NoState), StatusPolicy::default());
        let server = Server::new(ServerConfig::default(), handler);

        let shutdown = ShutdownSignal::new();
        let task = tokio::spawn(server.serve(listener, shutdown.clone()));
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("server should stop")
            .expect("server task should not panic");
    }

    #[tokio::test]
    async fn test_unreadable_body_uses_policy_status() {
        let policy = StatusPolicy::default().with_body_read(http::StatusCode::REQUEST_TIMEOUT);
        let handler = RouteTable::<NoState>::new().into_handler(Arc::new(NoState), policy);
        let server = Server::new(ServerConfig::default(), handler);

        let cause = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection reset");
        let response = server.reject_body("/v1/users/a@b.com/keys", &cause);

        assert_eq!(response.status(), http::StatusCode::REQUEST_TIMEOUT);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "BODY_READ_ERROR");
        assert!(json["error"]["message"].as_str().unwrap().contains("connection reset"));
    }
}
