//! JSON documents rendered by the routes.
//!
//! Each view carries the flash messages taken from the session at render time.

use serde::{Deserialize, Serialize};
use todo_core::{sorted_lists, sorted_todos, ListId, Todo, TodoList};

use crate::session::Flash;

/// One row of the list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    pub id: ListId,
    pub name: String,
    pub complete: bool,
    pub remaining: usize,
    pub total: usize,
    /// `"remaining / total"`.
    pub progress: String,
}

impl From<&TodoList> for ListSummary {
    fn from(list: &TodoList) -> Self {
        Self {
            id: list.id,
            name: list.name.clone(),
            complete: list.is_complete(),
            remaining: list.remaining_count(),
            total: list.total_count(),
            progress: list.progress(),
        }
    }
}

/// `GET /lists`: incomplete lists first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListIndexView {
    pub lists: Vec<ListSummary>,
    #[serde(default)]
    pub flash: Flash,
}

impl ListIndexView {
    pub fn new(lists: &[TodoList], flash: Flash) -> Self {
        Self {
            lists: sorted_lists(lists).into_iter().map(ListSummary::from).collect(),
            flash,
        }
    }
}

/// `GET /lists/{id}`: open todos first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListView {
    pub id: ListId,
    pub name: String,
    pub complete: bool,
    pub remaining: usize,
    pub total: usize,
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub flash: Flash,
}

impl ListView {
    pub fn new(list: &TodoList, flash: Flash) -> Self {
        Self {
            id: list.id,
            name: list.name.clone(),
            complete: list.is_complete(),
            remaining: list.remaining_count(),
            total: list.total_count(),
            todos: sorted_todos(&list.todos).into_iter().cloned().collect(),
            flash,
        }
    }
}

/// `GET /lists/new`, and the form redisplayed after a rejected name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListView {
    pub list_name: String,
    #[serde(default)]
    pub flash: Flash,
}

/// `GET /edit/{id}`, and the form redisplayed after a rejected name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditListView {
    pub id: ListId,
    pub name: String,
    pub new_name: String,
    #[serde(default)]
    pub flash: Flash,
}

impl EditListView {
    pub fn new(list: &TodoList, new_name: impl Into<String>, flash: Flash) -> Self {
        Self {
            id: list.id,
            name: list.name.clone(),
            new_name: new_name.into(),
            flash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groceries() -> TodoList {
        let mut list = TodoList::new(1, "Groceries");
        list.todos = vec![
            Todo {
                id: 1,
                name: "Milk".into(),
                completed: true,
            },
            Todo::new(2, "Eggs"),
        ];
        list
    }

    #[test]
    fn summary_reports_progress() {
        let summary = ListSummary::from(&groceries());
        assert!(!summary.complete);
        assert_eq!(summary.remaining, 1);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.progress, "1 / 2");
    }

    #[test]
    fn list_view_orders_open_todos_first() {
        let view = ListView::new(&groceries(), Flash::default());
        let names: Vec<&str> = view.todos.iter().map(|todo| todo.name.as_str()).collect();
        assert_eq!(names, vec!["Eggs", "Milk"]);
    }

    #[test]
    fn index_orders_complete_lists_last() {
        let mut done = TodoList::new(1, "Done");
        done.todos.push(Todo {
            id: 1,
            name: "x".into(),
            completed: true,
        });
        let open = TodoList::new(2, "Open");

        let view = ListIndexView::new(&[done, open], Flash::success("hi"));
        let ids: Vec<ListId> = view.lists.iter().map(|list| list.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(view.flash.success.as_deref(), Some("hi"));
    }

    #[test]
    fn flash_is_omitted_when_empty() {
        let view = NewListView {
            list_name: String::new(),
            flash: Flash::default(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["flash"], serde_json::json!({}));
    }
}
