//! Application state shared across handlers.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::config::{AdminConfig, api_token};

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    /// SHA-256 of the configured API token. Requests are compared by digest.
    api_token_digest: Option<[u8; 32]>,
}

impl AppState {
    /// Create application state.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let api_token_digest = api_token(&config).map(token_digest);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                api_token_digest,
            }),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get the database pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Digest of the API token, `None` when the API is unguarded.
    #[must_use]
    pub fn api_token_digest(&self) -> Option<&[u8; 32]> {
        self.inner.api_token_digest.as_ref()
    }
}

/// SHA-256 digest of a bearer token.
#[must_use]
pub fn token_digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}
