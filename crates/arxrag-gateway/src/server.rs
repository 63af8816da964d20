use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use arxrag_memory::Embedder;
use tokio::sync::watch;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::router::build_router;

#[derive(Clone)]
pub(crate) struct AppState {
    pub embedder: Arc<dyn Embedder>,
    pub started_at: Instant,
}

pub struct GatewayServer {
    addr: SocketAddr,
    max_body_size: usize,
    embedder: Arc<dyn Embedder>,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewayServer {
    #[must_use]
    pub fn new(
        bind: &str,
        port: u16,
        embedder: Arc<dyn Embedder>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gateway binding to 0.0.0.0, reachable from every interface");
        }

        Self {
            addr,
            max_body_size: 1_048_576,
            embedder,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn from_config(
        config: &GatewayConfig,
        embedder: Arc<dyn Embedder>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self::new(&config.bind, config.port, embedder, shutdown_rx)
            .with_max_body_size(config.max_body_size)
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Serve until the shutdown channel flips to `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let state = AppState {
            embedder: self.embedder,
            started_at: Instant::now(),
        };
        let router = build_router(state, self.max_body_size);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!("gateway listening on {}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                tracing::info!("gateway shutting down");
            })
            .await
            .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use arxrag_memory::embedder::{EmbedError, EmbedFuture};

    use super::*;

    struct NoopEmbedder;

    impl Embedder for NoopEmbedder {
        fn embed<'a>(&'a self, _text: &'a str) -> EmbedFuture<'a> {
            Box::pin(async { Err(EmbedError::EmptyResponse) })
        }

        fn model(&self) -> &str {
            "noop"
        }
    }

    #[test]
    fn from_config_applies_limits() {
        let (_tx, rx) = watch::channel(false);
        let config = GatewayConfig {
            bind: "127.0.0.1".into(),
            port: 8123,
            max_body_size: 512,
        };
        let server = GatewayServer::from_config(&config, Arc::new(NoopEmbedder), rx);
        assert_eq!(server.addr.port(), 8123);
        assert_eq!(server.max_body_size, 512);
    }

    #[test]
    fn invalid_bind_falls_back_to_loopback() {
        let (_tx, rx) = watch::channel(false);
        let server = GatewayServer::new("not_an_ip", 9999, Arc::new(NoopEmbedder), rx);
        assert_eq!(server.addr, SocketAddr::from(([127, 0, 0, 1], 9999)));
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown_signal() {
        let (tx, rx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 0, Arc::new(NoopEmbedder), rx);
        let handle = tokio::spawn(server.serve());
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
