//! Ephemeral store that lives as long as one user session.
//!
//! # Design
//! Lists are kept in a `Vec` in creation order behind a shared `RwLock`, so
//! a clone of the handle observes the same data. Ids are recomputed from the
//! current contents on every insert (highest id + 1). List names are unique
//! under the write lock, the same guarantee the database's constraint gives.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::{StoreResult, TodoStore};
use crate::types::{next_id, ListId, Todo, TodoId, TodoList};

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    lists: Arc<RwLock<Vec<TodoList>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` until the first list is created.
    pub async fn is_empty(&self) -> bool {
        self.lists.read().await.is_empty()
    }

    /// Apply `update` to the list with `id`, if there is one.
    async fn with_list<F>(&self, id: ListId, update: F)
    where
        F: FnOnce(&mut TodoList) + Send,
    {
        let mut lists = self.lists.write().await;
        if let Some(list) = lists.iter_mut().find(|list| list.id == id) {
            update(list);
        }
    }
}

#[async_trait]
impl TodoStore for SessionStore {
    async fn find_list(&self, id: ListId) -> StoreResult<Option<TodoList>> {
        let lists = self.lists.read().await;
        Ok(lists.iter().find(|list| list.id == id).cloned())
    }

    async fn all_lists(&self) -> StoreResult<Vec<TodoList>> {
        Ok(self.lists.read().await.clone())
    }

    async fn create_list(&self, name: &str) -> StoreResult<ListId> {
        let mut lists = self.lists.write().await;
        if lists.iter().any(|list| list.name == name) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        let id = next_id(lists.iter().map(|list| list.id));
        lists.push(TodoList::new(id, name));
        Ok(id)
    }

    async fn delete_list(&self, id: ListId) -> StoreResult<()> {
        self.lists.write().await.retain(|list| list.id != id);
        Ok(())
    }

    async fn rename_list(&self, id: ListId, new_name: &str) -> StoreResult<()> {
        let mut lists = self.lists.write().await;
        if lists
            .iter()
            .any(|list| list.id != id && list.name == new_name)
        {
            return Err(StoreError::DuplicateName(new_name.to_string()));
        }
        if let Some(list) = lists.iter_mut().find(|list| list.id == id) {
            list.name = new_name.to_string();
        }
        Ok(())
    }

    async fn create_todo(&self, list_id: ListId, name: &str) -> StoreResult<Option<TodoId>> {
        let mut assigned = None;
        self.with_list(list_id, |list| {
            let id = next_id(list.todos.iter().map(|todo| todo.id));
            list.todos.push(Todo::new(id, name));
            assigned = Some(id);
        })
        .await;
        Ok(assigned)
    }

    async fn delete_todo(&self, list_id: ListId, todo_id: TodoId) -> StoreResult<()> {
        self.with_list(list_id, |list| list.todos.retain(|todo| todo.id != todo_id))
            .await;
        Ok(())
    }

    async fn set_todo_status(
        &self,
        list_id: ListId,
        todo_id: TodoId,
        completed: bool,
    ) -> StoreResult<()> {
        self.with_list(list_id, |list| {
            if let Some(todo) = list.todos.iter_mut().find(|todo| todo.id == todo_id) {
                todo.completed = completed;
            }
        })
        .await;
        Ok(())
    }

    async fn complete_all(&self, list_id: ListId) -> StoreResult<()> {
        self.with_list(list_id, |list| {
            list.todos.iter_mut().for_each(|todo| todo.completed = true);
        })
        .await;
        Ok(())
    }
}
