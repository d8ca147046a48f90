//! HTTP front end for the todo manager.
//!
//! # Overview
//! Maps routes onto a [`todo_core::TodoStore`] and renders JSON views. The
//! store is chosen per request: the caller's session store in `session`
//! mode, or the shared `PostgreSQL` store in `database` mode.
//!
//! # Design
//! - `session_layer` resolves the session cookie and collects flash messages
//!   from responses; handlers never touch cookies.
//! - Handlers take a [`state::Store`] extractor instead of reaching into
//!   global state.
//! - A missing list is an error value ([`error::AppError::ListNotFound`]) that
//!   renders as a redirect to the index.

pub mod config;
pub mod error;
pub mod postgres;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use config::{ServerConfig, StorageMode};
pub use error::{AppError, StartupError};
pub use postgres::PostgresStore;
pub use session::{Flash, Session, SessionRegistry};
pub use state::{AppState, Backend, Store};

/// Router with per-session in-memory storage.
pub fn app() -> Router {
    router(AppState::new(Backend::Session))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/lists", get(routes::index).post(routes::create_list))
        .route("/lists/new", get(routes::new_list_form))
        .route("/lists/{list_id}", get(routes::show_list))
        .route("/lists/{list_id}/todos", post(routes::create_todo))
        .route(
            "/lists/{list_id}/delete/{todo_id}",
            post(routes::delete_todo),
        )
        .route(
            "/lists/{list_id}/complete/{todo_id}",
            post(routes::set_todo_status),
        )
        .route("/lists/{list_id}/complete-all", post(routes::complete_all))
        .route(
            "/edit/{list_id}",
            get(routes::edit_list_form).post(routes::rename_list),
        )
        .route("/delete/{list_id}", post(routes::delete_list))
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            session::session_layer,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}
