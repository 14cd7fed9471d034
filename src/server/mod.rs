//! HTTP server implementation
//!
//! Sets up the Axum HTTP server with:
//! - Key-value API routes
//! - Middleware (tracing, timeout, compression, CORS)
//! - Graceful shutdown

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::info;

use crate::config::Config;
use crate::errors::Result;
use crate::routes::{self, AppState};
use crate::storage::StorageBackend;

/// HTTP server for bucket-kv
pub struct Server {
    config: Config,
    storage: Arc<dyn StorageBackend>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config, storage: Arc<dyn StorageBackend>) -> Self {
        Self { config, storage }
    }

    /// Build the Axum router with all middleware
    fn build_router(&self) -> Router {
        let state = AppState::new(&self.config, self.storage.clone());
        routes::create_router(state, self.config.server.max_body_size).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    self.config.server.timeout_secs,
                )))
                .layer(CompressionLayer::new())
                // Browser clients call the gateway directly
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
    }

    /// Start the server and run until shutdown signal
    pub async fn start<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = self.build_router();

        let listener = tokio::net::TcpListener::bind(self.config.server.bind_address).await?;
        info!(address = %self.config.server.bind_address, "Server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
