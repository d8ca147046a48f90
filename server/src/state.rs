//! Shared application state and the per-request store handle.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use todo_core::TodoStore;

use crate::config::{ConfigurationError, ServerConfig, StorageMode};
use crate::error::StartupError;
use crate::postgres::PostgresStore;
use crate::session::{Session, SessionRegistry};

/// Which backend serves a request.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Every session gets its own in-memory store.
    Session,
    /// All sessions share one database.
    Database(Arc<PostgresStore>),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub backend: Backend,
}

impl AppState {
    pub fn new(backend: Backend) -> Self {
        Self::with_sessions(backend, SessionRegistry::new())
    }

    pub fn with_sessions(backend: Backend, sessions: SessionRegistry) -> Self {
        Self { sessions, backend }
    }

    /// Connect the configured backend, applying the schema in database mode.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, StartupError> {
        let backend = match config.storage_mode {
            StorageMode::Session => Backend::Session,
            StorageMode::Database => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or(ConfigurationError::MissingDatabaseUrl)?;
                let store = PostgresStore::connect(url).await?;
                store.migrate().await?;
                Backend::Database(Arc::new(store))
            }
        };
        let sessions = SessionRegistry::with_idle_timeout(config.session_idle_timeout);
        Ok(Self::with_sessions(backend, sessions))
    }
}

/// The store a handler should use for this request.
pub struct Store(pub Arc<dyn TodoStore>);

impl FromRequestParts<AppState> for Store {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match &state.backend {
            Backend::Database(store) => Ok(Self(Arc::clone(store) as Arc<dyn TodoStore>)),
            Backend::Session => {
                let session = Session::from_request_parts(parts, state).await?;
                Ok(Self(Arc::new(session.store().clone())))
            }
        }
    }
}
