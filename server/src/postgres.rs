//! `PostgreSQL` implementation of [`TodoStore`].
//!
//! # Table Schema
//!
//! See `migrations/schema.sql`. Todos are keyed by `(list_id, id)` so todo ids
//! are scoped to their list, matching the session store. Both tables assign
//! ids as "highest id + 1" inside the insert statement while holding a table
//! lock, which serializes concurrent creators.
//!
//! Reads go through a single `LEFT JOIN` statement so a reader never sees a
//! todo whose list has already been removed. Multi-statement writes run in a
//! transaction.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use todo_core::{ListId, StoreError, StoreResult, Todo, TodoId, TodoList, TodoStore};

const SCHEMA: &str = include_str!("../migrations/schema.sql");

/// Name of the unique constraint on `lists.name` in the schema.
const LIST_NAME_CONSTRAINT: &str = "lists_name_key";

const SELECT_LISTS: &str = "SELECT l.id AS list_id, l.name AS list_name, \
     t.id AS todo_id, t.description, t.completed \
     FROM lists l LEFT JOIN todos t ON t.list_id = l.id";
const ORDER_LISTS: &str = "ORDER BY l.id, t.id";

const LOCK_LISTS: &str = "LOCK TABLE lists IN SHARE ROW EXCLUSIVE MODE";
const LOCK_TODOS: &str = "LOCK TABLE todos IN SHARE ROW EXCLUSIVE MODE";

const INSERT_LIST: &str = "INSERT INTO lists (id, name) \
     SELECT COALESCE(MAX(id), 0) + 1, $1 FROM lists \
     RETURNING id";
const INSERT_TODO: &str = "INSERT INTO todos (list_id, id, description) \
     SELECT l.id, (SELECT COALESCE(MAX(t.id), 0) + 1 FROM todos t WHERE t.list_id = l.id), $2 \
     FROM lists l WHERE l.id = $1 \
     RETURNING id";

const DELETE_LIST_TODOS: &str = "DELETE FROM todos WHERE list_id = $1";
const DELETE_LIST: &str = "DELETE FROM lists WHERE id = $1";
const RENAME_LIST: &str = "UPDATE lists SET name = $1 WHERE id = $2";
const DELETE_TODO: &str = "DELETE FROM todos WHERE list_id = $1 AND id = $2";
const SET_TODO_STATUS: &str = "UPDATE todos SET completed = $1 WHERE list_id = $2 AND id = $3";
const COMPLETE_ALL: &str = "UPDATE todos SET completed = true WHERE list_id = $1";

/// One row of the lists/todos join. Todo columns are `NULL` for empty lists.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ListTodoRow {
    pub list_id: i64,
    pub list_name: String,
    pub todo_id: Option<i64>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(database_error)?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    pub async fn migrate(&self) -> StoreResult<()> {
        tracing::info!("applying database schema");
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_lists(&self, list_id: Option<i64>) -> StoreResult<Vec<TodoList>> {
        let rows: Vec<ListTodoRow> = match list_id {
            Some(id) => {
                let sql = format!("{SELECT_LISTS} WHERE l.id = $1 {ORDER_LISTS}");
                tracing::debug!(%sql, list_id = id, "query");
                sqlx::query_as::<_, ListTodoRow>(&sql).bind(id).fetch_all(&self.pool).await
            }
            None => {
                let sql = format!("{SELECT_LISTS} {ORDER_LISTS}");
                tracing::debug!(%sql, "query");
                sqlx::query_as::<_, ListTodoRow>(&sql).fetch_all(&self.pool).await
            }
        }
        .map_err(database_error)?;
        assemble_lists(rows)
    }

    /// Run a single statement bound to the given ids, ignoring how many rows it touched.
    async fn execute_ids(&self, sql: &'static str, ids: &[i64]) -> StoreResult<()> {
        tracing::debug!(sql, ?ids, "execute");
        let mut query = sqlx::query(sql);
        for id in ids {
            query = query.bind(*id);
        }
        query.execute(&self.pool).await.map_err(database_error)?;
        Ok(())
    }
}

#[async_trait]
impl TodoStore for PostgresStore {
    async fn find_list(&self, id: ListId) -> StoreResult<Option<TodoList>> {
        let Some(id) = encode_id(id) else {
            return Ok(None);
        };
        Ok(self.fetch_lists(Some(id)).await?.into_iter().next())
    }

    async fn all_lists(&self) -> StoreResult<Vec<TodoList>> {
        self.fetch_lists(None).await
    }

    async fn create_list(&self, name: &str) -> StoreResult<ListId> {
        let mut transaction = self.pool.begin().await.map_err(database_error)?;

        tracing::debug!(sql = LOCK_LISTS, "execute");
        sqlx::query(LOCK_LISTS)
            .execute(&mut *transaction)
            .await
            .map_err(database_error)?;

        tracing::debug!(sql = INSERT_LIST, name, "execute");
        let (id,): (i64,) = sqlx::query_as(INSERT_LIST)
            .bind(name)
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| list_write_error(error, name))?;

        transaction.commit().await.map_err(database_error)?;
        decode_id(id, "lists.id")
    }

    async fn delete_list(&self, id: ListId) -> StoreResult<()> {
        let Some(id) = encode_id(id) else {
            return Ok(());
        };
        let mut transaction = self.pool.begin().await.map_err(database_error)?;

        for sql in [DELETE_LIST_TODOS, DELETE_LIST] {
            tracing::debug!(sql, list_id = id, "execute");
            sqlx::query(sql)
                .bind(id)
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;
        }

        transaction.commit().await.map_err(database_error)
    }

    async fn rename_list(&self, id: ListId, new_name: &str) -> StoreResult<()> {
        let Some(id) = encode_id(id) else {
            return Ok(());
        };
        tracing::debug!(sql = RENAME_LIST, new_name, list_id = id, "execute");
        sqlx::query(RENAME_LIST)
            .bind(new_name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|error| list_write_error(error, new_name))?;
        Ok(())
    }

    async fn create_todo(&self, list_id: ListId, name: &str) -> StoreResult<Option<TodoId>> {
        let Some(list_id) = encode_id(list_id) else {
            return Ok(None);
        };
        let mut transaction = self.pool.begin().await.map_err(database_error)?;

        tracing::debug!(sql = LOCK_TODOS, "execute");
        sqlx::query(LOCK_TODOS)
            .execute(&mut *transaction)
            .await
            .map_err(database_error)?;

        tracing::debug!(sql = INSERT_TODO, list_id, name, "execute");
        let inserted: Option<(i64,)> = sqlx::query_as(INSERT_TODO)
            .bind(list_id)
            .bind(name)
            .fetch_optional(&mut *transaction)
            .await
            .map_err(database_error)?;

        transaction.commit().await.map_err(database_error)?;
        inserted
            .map(|(id,)| decode_id(id, "todos.id"))
            .transpose()
    }

    async fn delete_todo(&self, list_id: ListId, todo_id: TodoId) -> StoreResult<()> {
        match (encode_id(list_id), encode_id(todo_id)) {
            (Some(list_id), Some(todo_id)) => self.execute_ids(DELETE_TODO, &[list_id, todo_id]).await,
            _ => Ok(()),
        }
    }

    async fn set_todo_status(
        &self,
        list_id: ListId,
        todo_id: TodoId,
        completed: bool,
    ) -> StoreResult<()> {
        let (Some(list_id), Some(todo_id)) = (encode_id(list_id), encode_id(todo_id)) else {
            return Ok(());
        };
        tracing::debug!(sql = SET_TODO_STATUS, completed, list_id, todo_id, "execute");
        sqlx::query(SET_TODO_STATUS)
            .bind(completed)
            .bind(list_id)
            .bind(todo_id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn complete_all(&self, list_id: ListId) -> StoreResult<()> {
        match encode_id(list_id) {
            Some(list_id) => self.execute_ids(COMPLETE_ALL, &[list_id]).await,
            None => Ok(()),
        }
    }
}

fn database_error(error: sqlx::Error) -> StoreError {
    tracing::error!(%error, "database operation failed");
    StoreError::Database(error.to_string())
}

/// A concurrent writer can take a name between the route's check and the
/// write; the constraint violation is reported as a duplicate name.
fn list_write_error(error: sqlx::Error, name: &str) -> StoreError {
    if is_list_name_violation(&error) {
        tracing::debug!(name, "list name taken by a concurrent write");
        return StoreError::DuplicateName(name.to_string());
    }
    database_error(error)
}

fn is_list_name_violation(error: &sqlx::Error) -> bool {
    error.as_database_error().is_some_and(|database| {
        database.is_unique_violation() && database.constraint() == Some(LIST_NAME_CONSTRAINT)
    })
}

/// Ids above `i64::MAX` cannot exist in the database.
fn encode_id(id: u64) -> Option<i64> {
    i64::try_from(id).ok()
}

fn decode_id(raw: i64, column: &str) -> StoreResult<u64> {
    u64::try_from(raw)
        .map_err(|_| StoreError::CorruptRecord(format!("{column} holds negative id {raw}")))
}

/// Fold join rows (ordered by list id, then todo id) into lists.
pub(crate) fn assemble_lists(rows: Vec<ListTodoRow>) -> StoreResult<Vec<TodoList>> {
    let mut lists: Vec<TodoList> = Vec::new();

    for row in rows {
        let list_id = decode_id(row.list_id, "lists.id")?;
        if lists.last().map(|list| list.id) != Some(list_id) {
            lists.push(TodoList::new(list_id, row.list_name));
        }

        let Some(todo_id) = row.todo_id else {
            continue;
        };
        let name = row.description.ok_or_else(|| {
            StoreError::CorruptRecord(format!("todo {todo_id} of list {list_id} has no description"))
        })?;
        let todo = Todo {
            id: decode_id(todo_id, "todos.id")?,
            name,
            completed: row.completed.unwrap_or(false),
        };
        if let Some(list) = lists.last_mut() {
            list.todos.push(todo);
        }
    }

    Ok(lists)
}
