//! Daemon - the main gateway service
//!
//! Wires the database, backend client, token service and handlers together
//! and serves the HTTP API until interrupted.

use std::sync::Arc;

use crate::api::ApiServerBuilder;
use crate::backend::{Backend, HttpBackend};
use crate::db::{self, DbPool, SqliteTokenStore};
use crate::handler::InvocationHandler;
use crate::security::SetupTokenService;
use crate::skill::SkillHandler;
use crate::smarthome::SmartHomeRouter;
use crate::{Config, Result};

/// The shutter gateway daemon
pub struct Daemon {
    config: Config,
    db: DbPool,
    handler: InvocationHandler,
    router: SmartHomeRouter,
    tokens: SetupTokenService,
}

impl Daemon {
    /// Create a new daemon instance with the HTTP backend
    ///
    /// # Errors
    ///
    /// Returns error if the database or backend client cannot be initialized
    pub fn new(config: Config) -> Result<Self> {
        let backend = Arc::new(HttpBackend::new(&config.backend)?);
        Self::with_backend(config, backend)
    }

    /// Create a daemon over any backend
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be initialized
    pub fn with_backend(config: Config, backend: Arc<dyn Backend>) -> Result<Self> {
        let db_path = config.database_path();
        let db = db::init(&db_path)?;
        tracing::info!(path = %db_path.display(), "database initialized");

        let tokens = SetupTokenService::new(Arc::new(SqliteTokenStore::new(db.clone())));
        let router = SmartHomeRouter::new(backend.clone());
        let skill = SkillHandler::new(backend, tokens.clone(), config.skill.clone());
        let handler = InvocationHandler::new(router.clone(), skill);

        Ok(Self {
            config,
            db,
            handler,
            router,
            tokens,
        })
    }

    /// Event handler shared by every entry point
    #[must_use]
    pub const fn handler(&self) -> &InvocationHandler {
        &self.handler
    }

    /// Directive router
    #[must_use]
    pub const fn router(&self) -> &SmartHomeRouter {
        &self.router
    }

    /// Setup-token service
    #[must_use]
    pub const fn tokens(&self) -> &SetupTokenService {
        &self.tokens
    }

    /// Run the daemon until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if the API server fails
    pub async fn run(self) -> Result<()> {
        let port = self.config.api_server.port;
        tracing::info!(
            port,
            backend = %self.config.backend.base_url,
            "daemon running"
        );

        let server = ApiServerBuilder::new(self.db, self.handler, self.tokens)
            .port(port)
            .backend_token_configured(self.config.backend.access_token.is_some())
            .build();

        tokio::select! {
            result = server.run() => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    }
}
