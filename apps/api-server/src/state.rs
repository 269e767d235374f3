//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{PostRepository, SessionVerifier};
use quill_core::service::PostService;
use quill_infra::{InMemoryPostRepository, JwtSessionVerifier};

use crate::config::AppConfig;

#[cfg(feature = "postgres")]
use quill_infra::PostgresPostRepository;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub sessions: Arc<dyn SessionVerifier>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let sessions: Arc<dyn SessionVerifier> =
            Arc::new(JwtSessionVerifier::new(config.session.clone()));

        Self::with_repository(repository(config).await, sessions)
    }

    pub fn with_repository(
        repo: Arc<dyn PostRepository>,
        sessions: Arc<dyn SessionVerifier>,
    ) -> Self {
        Self {
            posts: PostService::new(repo),
            sessions,
        }
    }
}

#[cfg(feature = "postgres")]
async fn repository(config: &AppConfig) -> Arc<dyn PostRepository> {
    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return Arc::new(InMemoryPostRepository::new());
    };

    match quill_infra::connect(db_config).await {
        Ok(db) => Arc::new(PostgresPostRepository::new(db)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
            Arc::new(InMemoryPostRepository::new())
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn repository(_config: &AppConfig) -> Arc<dyn PostRepository> {
    tracing::info!("Running without postgres feature - using in-memory repository");
    Arc::new(InMemoryPostRepository::new())
}
