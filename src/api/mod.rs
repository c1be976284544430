//! HTTP API server for the shutter gateway

pub mod health;
pub mod invoke;
pub mod setup;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::DEFAULT_PORT;
use crate::db::DbPool;
use crate::handler::InvocationHandler;
use crate::security::SetupTokenService;
use crate::Result;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub db: DbPool,
    pub handler: InvocationHandler,
    pub tokens: SetupTokenService,
    /// Whether a static backend token is configured
    pub backend_token_configured: bool,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    db: DbPool,
    handler: InvocationHandler,
    tokens: SetupTokenService,
    port: u16,
    backend_token_configured: bool,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub const fn new(db: DbPool, handler: InvocationHandler, tokens: SetupTokenService) -> Self {
        Self {
            db,
            handler,
            tokens,
            port: DEFAULT_PORT,
            backend_token_configured: false,
        }
    }

    /// Set the listen port
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Record whether the backend has a static token
    #[must_use]
    pub const fn backend_token_configured(mut self, configured: bool) -> Self {
        self.backend_token_configured = configured;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        ApiServer {
            state: Arc::new(ApiState {
                db: self.db,
                handler: self.handler,
                tokens: self.tokens,
                backend_token_configured: self.backend_token_configured,
            }),
            port: self.port,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(invoke::router(self.state.clone()))
            .nest("/api/setup", setup::router(self.state.clone()))
            .merge(health::router())
            .merge(health::ready_router(self.state.clone()))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
