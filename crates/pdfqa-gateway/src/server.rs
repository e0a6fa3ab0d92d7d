use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pdfqa_core::{PdfIngestor, QaService};
use pdfqa_memory::SqliteStore;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::error::GatewayError;
use crate::rate_limit::RateLimiter;
use crate::router::build_router;

#[derive(Clone)]
pub(crate) struct AppState {
    pub ingestor: PdfIngestor,
    pub qa: QaService,
    pub store: SqliteStore,
    pub limiter: Arc<RateLimiter>,
}

pub struct GatewayServer {
    addr: SocketAddr,
    rate_limit: u32,
    rate_window: Duration,
    max_body_size: usize,
    ingestor: PdfIngestor,
    qa: QaService,
    store: SqliteStore,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewayServer {
    #[must_use]
    pub fn new(
        bind: &str,
        port: u16,
        store: SqliteStore,
        ingestor: PdfIngestor,
        qa: QaService,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gateway binding to 0.0.0.0, reachable from any interface");
        }

        Self {
            addr,
            rate_limit: 5,
            rate_window: Duration::from_secs(60),
            max_body_size: 50 * 1024 * 1024,
            ingestor,
            qa,
            store,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn with_rate_limit(mut self, limit: u32, window: Duration) -> Self {
        self.rate_limit = limit;
        self.rate_window = window;
        self
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Bind the configured address and serve until shutdown is signalled.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener until shutdown is signalled.
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a fatal I/O error.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), GatewayError> {
        let state = AppState {
            ingestor: self.ingestor,
            qa: self.qa,
            store: self.store,
            limiter: Arc::new(RateLimiter::new(self.rate_limit, self.rate_window)),
        };
        let router = build_router(state, self.max_body_size);

        match listener.local_addr() {
            Ok(addr) => tracing::info!("gateway listening on {addr}"),
            Err(e) => tracing::warn!("gateway listening on unknown address: {e}"),
        }

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
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
