//! Domain types for the todo manager.
//!
//! # Design
//! A `TodoList` owns its todos directly; there is no separate todo table in
//! the model. Identifiers are plain integers assigned by the store as
//! "highest existing id + 1", so list ids are unique across lists and todo
//! ids are unique only within their parent list.

use serde::{Deserialize, Serialize};

/// Identifier of a list, unique across all lists in a store.
pub type ListId = u64;

/// Identifier of a todo, unique only within its parent list.
pub type TodoId = u64;

/// A single todo item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub name: String,
    pub completed: bool,
}

impl Todo {
    /// A freshly added todo always starts open.
    pub fn new(id: TodoId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            completed: false,
        }
    }
}

/// A named, ordered collection of todos.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoList {
    pub id: ListId,
    pub name: String,
    pub todos: Vec<Todo>,
}

impl TodoList {
    pub fn new(id: ListId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            todos: Vec::new(),
        }
    }

    /// A list is complete when it has at least one todo and every todo is done.
    pub fn is_complete(&self) -> bool {
        !self.todos.is_empty() && self.todos.iter().all(|todo| todo.completed)
    }

    /// Number of todos still open.
    pub fn remaining_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.completed).count()
    }

    pub fn total_count(&self) -> usize {
        self.todos.len()
    }

    /// `"remaining / total"`, as shown next to each list in the index.
    pub fn progress(&self) -> String {
        format!("{} / {}", self.remaining_count(), self.total_count())
    }
}

/// Next identifier for a collection: highest existing id + 1, or 1 when empty.
pub fn next_id(ids: impl IntoIterator<Item = u64>) -> u64 {
    ids.into_iter().max().unwrap_or(0) + 1
}

/// Incomplete lists first; relative order is otherwise preserved.
pub fn sorted_lists(lists: &[TodoList]) -> Vec<&TodoList> {
    let mut sorted: Vec<&TodoList> = lists.iter().collect();
    sorted.sort_by_key(|list| list.is_complete());
    sorted
}

/// Open todos first; relative order is otherwise preserved.
pub fn sorted_todos(todos: &[Todo]) -> Vec<&Todo> {
    let mut sorted: Vec<&Todo> = todos.iter().collect();
    sorted.sort_by_key(|todo| todo.completed);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn list_with(statuses: &[bool]) -> TodoList {
        let mut list = TodoList::new(1, "Groceries");
        for (index, completed) in statuses.iter().enumerate() {
            list.todos.push(Todo {
                id: index as u64 + 1,
                name: format!("item {index}"),
                completed: *completed,
            });
        }
        list
    }

    #[rstest]
    #[case::empty(&[], false)]
    #[case::all_open(&[false, false], false)]
    #[case::mixed(&[true, false], false)]
    #[case::single_done(&[true], true)]
    #[case::all_done(&[true, true, true], true)]
    fn list_completion(#[case] statuses: &[bool], #[case] expected: bool) {
        assert_eq!(list_with(statuses).is_complete(), expected);
    }

    #[test]
    fn progress_counts_open_todos() {
        let list = list_with(&[true, false, false]);
        assert_eq!(list.remaining_count(), 2);
        assert_eq!(list.total_count(), 3);
        assert_eq!(list.progress(), "2 / 3");
    }

    #[test]
    fn next_id_starts_at_one() {
        assert_eq!(next_id(Vec::new()), 1);
    }

    #[test]
    fn next_id_reuses_freed_highest_id() {
        assert_eq!(next_id([1, 2]), 3);
        // 2 was deleted, so it is handed out again.
        assert_eq!(next_id([1]), 2);
    }

    #[test]
    fn sorted_lists_puts_complete_lists_last() {
        let mut done = list_with(&[true]);
        done.id = 1;
        done.name = "done".into();
        let mut open = list_with(&[false]);
        open.id = 2;
        open.name = "open".into();
        let empty = TodoList::new(3, "empty");

        let lists = vec![done, open, empty];
        let names: Vec<&str> = sorted_lists(&lists).iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["open", "empty", "done"]);
    }

    #[test]
    fn sorted_todos_is_stable() {
        let list = list_with(&[true, false, true, false]);
        let ids: Vec<TodoId> = sorted_todos(&list.todos).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn todo_serializes_to_json() {
        let todo = Todo::new(7, "Milk");
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "Milk");
        assert_eq!(json["completed"], false);
    }

    proptest! {
        #[test]
        fn next_id_exceeds_every_existing_id(ids in proptest::collection::vec(0u64..10_000, 0..50)) {
            let next = next_id(ids.clone());
            prop_assert!(ids.iter().all(|id| *id < next));
        }
    }
}
