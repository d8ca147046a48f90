//! Error types shared by the stores and the route layer.
//!
//! # Design
//! Three failure kinds exist and each gets its own type, because callers
//! recover from them differently: `NameError` is shown back to the user,
//! `ListNotFound` turns into a redirect, and `StoreError` aborts the request.

use thiserror::Error;

use crate::types::ListId;

/// Shortest and longest accepted name, in characters.
pub const NAME_MIN_CHARS: usize = 1;
pub const NAME_MAX_CHARS: usize = 100;

/// A proposed list or todo name was rejected. No state was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("The name must be between 1 and 100 characters.")]
    Length,

    #[error("The name must not contain control characters.")]
    ControlCharacter,

    #[error("The list name must be unique.")]
    Duplicate,
}

/// The referenced list does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("list {id} not found")]
pub struct ListNotFound {
    pub id: ListId,
}

/// Failure inside a storage backend.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Connection, query or transaction failure.
    #[error("database error: {0}")]
    Database(String),

    /// A stored value could not be mapped back to the domain type.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// Another list already holds the name. Raised when a write races past
    /// the route's uniqueness check.
    #[error("list name '{0}' is already taken")]
    DuplicateName(String),
}
