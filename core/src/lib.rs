//! Core of the multi-list todo manager.
//!
//! # Overview
//! Holds the data model, the name validation rules and the storage contract
//! shared by every backend, plus the ephemeral per-session backend. The HTTP
//! layer and the database backend live in the server crate.
//!
//! # Design
//! - `TodoStore` is an object-safe async trait so the server can pick a
//!   backend per request and hand it to handlers as `Arc<dyn TodoStore>`.
//! - Lookups that can miss return `Option`; `load_list` lifts that into
//!   `ListNotFound` for the route layer.
//! - Ids are "highest existing id + 1", computed at insert time.

pub mod error;
pub mod session_store;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{ListNotFound, NameError, StoreError};
pub use session_store::SessionStore;
pub use store::{list_names, load_list, StoreResult, TodoStore};
pub use types::{next_id, sorted_lists, sorted_todos, ListId, Todo, TodoId, TodoList};
pub use validation::{normalize_name, validate_name, validate_todo_name};
