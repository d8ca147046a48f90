//! The storage contract every backend implements.
//!
//! # Design
//! Routes receive an `Arc<dyn TodoStore>` per request and never know which
//! backend sits behind it. Mutations against an id that does not exist are
//! silent no-ops; callers are expected to resolve the list with
//! [`load_list`] before mutating it.

use async_trait::async_trait;

use crate::error::{ListNotFound, StoreError};
use crate::types::{ListId, TodoId, TodoList};

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// The list with its todos, or `None` when the id does not resolve.
    async fn find_list(&self, id: ListId) -> StoreResult<Option<TodoList>>;

    /// Every list with its todos, in creation order.
    async fn all_lists(&self) -> StoreResult<Vec<TodoList>>;

    /// Append an empty list and return its freshly assigned id.
    async fn create_list(&self, name: &str) -> StoreResult<ListId>;

    /// Remove the list together with all of its todos.
    async fn delete_list(&self, id: ListId) -> StoreResult<()>;

    async fn rename_list(&self, id: ListId, new_name: &str) -> StoreResult<()>;

    /// Append an open todo. Returns `None` when the list does not exist.
    async fn create_todo(&self, list_id: ListId, name: &str) -> StoreResult<Option<TodoId>>;

    async fn delete_todo(&self, list_id: ListId, todo_id: TodoId) -> StoreResult<()>;

    async fn set_todo_status(
        &self,
        list_id: ListId,
        todo_id: TodoId,
        completed: bool,
    ) -> StoreResult<()>;

    /// Mark every todo in the list as completed.
    async fn complete_all(&self, list_id: ListId) -> StoreResult<()>;
}

/// Resolve a list or report that it is missing.
///
/// The outer `Result` carries backend failures, the inner one the lookup
/// outcome, so a route can abort on the first and redirect on the second.
pub async fn load_list(
    store: &dyn TodoStore,
    id: ListId,
) -> StoreResult<Result<TodoList, ListNotFound>> {
    Ok(store.find_list(id).await?.ok_or(ListNotFound { id }))
}

/// Names of every stored list, for the uniqueness check.
pub async fn list_names(store: &dyn TodoStore) -> StoreResult<Vec<String>> {
    Ok(store
        .all_lists()
        .await?
        .into_iter()
        .map(|list| list.name)
        .collect())
}
