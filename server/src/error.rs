//! How route failures turn into responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use todo_core::{ListNotFound, StoreError};

use crate::config::ConfigurationError;
use crate::session::Flash;

pub const LIST_NOT_FOUND_MESSAGE: &str = "The specified list was not found.";

/// Body of a 500 response. Internal details stay in the logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Redirects to the index with an error flash.
    #[error(transparent)]
    ListNotFound(#[from] ListNotFound),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::ListNotFound(missing) => {
                tracing::warn!(list_id = missing.id, "list not found, redirecting to index");
                (Flash::error(LIST_NOT_FOUND_MESSAGE), Redirect::to("/lists")).into_response()
            }
            Self::Store(error) => {
                tracing::error!(%error, "storage failure");
                let body = ErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal error occurred".to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Anything that keeps the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
