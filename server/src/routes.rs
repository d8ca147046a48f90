//! Route handlers.
//!
//! Every route that targets a list resolves it first; a missing list
//! short-circuits into [`AppError::ListNotFound`] before anything is mutated.
//! Names are trimmed, then validated, then stored.

use axum::extract::{Form, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use todo_core::{
    list_names, load_list, normalize_name, validate_name, validate_todo_name, ListId, NameError,
    StoreError, StoreResult, TodoId, TodoList, TodoStore,
};

use crate::error::AppError;
use crate::session::{Flash, Session};
use crate::state::Store;
use crate::views::{EditListView, ListIndexView, ListView, NewListView};

pub const XHR_HEADER: &str = "x-requested-with";

#[derive(Debug, Deserialize)]
pub struct NewListForm {
    pub list_name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewTodoForm {
    pub todo_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameListForm {
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TodoStatusForm {
    #[serde(default)]
    pub completed: String,
}

pub fn list_path(id: ListId) -> String {
    format!("/lists/{id}")
}

/// `true` for requests sent by the page's script rather than a form submit.
pub fn is_xhr(headers: &HeaderMap) -> bool {
    headers
        .get(XHR_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest"))
}

async fn resolve_list(store: &dyn TodoStore, id: ListId) -> Result<TodoList, AppError> {
    Ok(load_list(store, id).await??)
}

/// Lift a store's duplicate-name refusal into the same outcome as a failed
/// uniqueness check, so a lost race renders like any other rejected name.
fn claim_name<T>(result: StoreResult<T>) -> StoreResult<Result<T, NameError>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(StoreError::DuplicateName(_)) => Ok(Err(NameError::Duplicate)),
        Err(error) => Err(error),
    }
}

fn rejected<V: serde::Serialize>(view: V) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(view)).into_response()
}

pub async fn root() -> Redirect {
    Redirect::to("/lists")
}

pub async fn index(session: Session, Store(store): Store) -> Result<Json<ListIndexView>, AppError> {
    let lists = store.all_lists().await?;
    Ok(Json(ListIndexView::new(&lists, session.take_flash().await)))
}

pub async fn new_list_form(session: Session) -> Json<NewListView> {
    Json(NewListView {
        list_name: String::new(),
        flash: session.take_flash().await,
    })
}

pub async fn create_list(
    session: Session,
    Store(store): Store,
    Form(form): Form<NewListForm>,
) -> Result<Response, AppError> {
    let name = normalize_name(&form.list_name);
    let names = list_names(store.as_ref()).await?;

    let created = match validate_name(name, names.iter().map(String::as_str)) {
        Ok(()) => claim_name(store.create_list(name).await)?,
        Err(error) => Err(error),
    };
    let id = match created {
        Ok(id) => id,
        Err(error) => {
            tracing::debug!(%error, name, "list name rejected");
            return Ok(rejected(NewListView {
                list_name: name.to_string(),
                flash: session.take_flash().await.with_error(error.to_string()),
            }));
        }
    };
    tracing::info!(list_id = id, name, "list created");
    Ok((Flash::success("The list has been created."), Redirect::to("/lists")).into_response())
}

pub async fn show_list(
    session: Session,
    Store(store): Store,
    Path(list_id): Path<ListId>,
) -> Result<Json<ListView>, AppError> {
    let list = resolve_list(store.as_ref(), list_id).await?;
    Ok(Json(ListView::new(&list, session.take_flash().await)))
}

pub async fn create_todo(
    session: Session,
    Store(store): Store,
    Path(list_id): Path<ListId>,
    Form(form): Form<NewTodoForm>,
) -> Result<Response, AppError> {
    let list = resolve_list(store.as_ref(), list_id).await?;
    let name = normalize_name(&form.todo_name);

    if let Err(error) = validate_todo_name(name) {
        tracing::debug!(%error, list_id, "todo name rejected");
        let flash = session.take_flash().await.with_error(error.to_string());
        return Ok(rejected(ListView::new(&list, flash)));
    }

    let todo_id = store.create_todo(list.id, name).await?;
    tracing::info!(list_id, todo_id = ?todo_id, name, "todo added");
    Ok((
        Flash::success("The todo was added."),
        Redirect::to(&list_path(list.id)),
    )
        .into_response())
}

pub async fn edit_list_form(
    session: Session,
    Store(store): Store,
    Path(list_id): Path<ListId>,
) -> Result<Json<EditListView>, AppError> {
    let list = resolve_list(store.as_ref(), list_id).await?;
    let flash = session.take_flash().await;
    Ok(Json(EditListView::new(&list, list.name.clone(), flash)))
}

pub async fn rename_list(
    session: Session,
    Store(store): Store,
    Path(list_id): Path<ListId>,
    Form(form): Form<RenameListForm>,
) -> Result<Response, AppError> {
    let list = resolve_list(store.as_ref(), list_id).await?;
    let name = normalize_name(&form.new_name);
    let names = list_names(store.as_ref()).await?;

    let renamed = match validate_name(name, names.iter().map(String::as_str)) {
        Ok(()) => claim_name(store.rename_list(list.id, name).await)?,
        Err(error) => Err(error),
    };
    if let Err(error) = renamed {
        tracing::debug!(%error, list_id, name, "new list name rejected");
        let flash = session.take_flash().await.with_error(error.to_string());
        return Ok(rejected(EditListView::new(&list, name, flash)));
    }

    tracing::info!(list_id, from = %list.name, to = name, "list renamed");
    Ok((
        Flash::success("The list has been updated."),
        Redirect::to(&list_path(list.id)),
    )
        .into_response())
}

/// Script callers get the index path back as the body and navigate there themselves.
pub async fn delete_list(
    Store(store): Store,
    Path(list_id): Path<ListId>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let list = resolve_list(store.as_ref(), list_id).await?;
    store.delete_list(list.id).await?;
    tracing::info!(list_id, name = %list.name, "list deleted");

    let flash = Flash::success(format!("The list '{}' has been deleted.", list.name));
    if is_xhr(&headers) {
        return Ok((flash, "/lists").into_response());
    }
    Ok((flash, Redirect::to("/lists")).into_response())
}

pub async fn delete_todo(
    Store(store): Store,
    Path((list_id, todo_id)): Path<(ListId, TodoId)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let list = resolve_list(store.as_ref(), list_id).await?;
    store.delete_todo(list.id, todo_id).await?;
    tracing::info!(list_id, todo_id, "todo deleted");

    let flash = Flash::success("The todo has been deleted.");
    if is_xhr(&headers) {
        return Ok((flash, StatusCode::NO_CONTENT).into_response());
    }
    Ok((flash, Redirect::to(&list_path(list.id))).into_response())
}

pub async fn set_todo_status(
    Store(store): Store,
    Path((list_id, todo_id)): Path<(ListId, TodoId)>,
    Form(form): Form<TodoStatusForm>,
) -> Result<Response, AppError> {
    let list = resolve_list(store.as_ref(), list_id).await?;
    let completed = form.completed == "true";
    store.set_todo_status(list.id, todo_id, completed).await?;
    tracing::info!(list_id, todo_id, completed, "todo status changed");

    Ok((
        Flash::success("The todo has been updated."),
        Redirect::to(&list_path(list.id)),
    )
        .into_response())
}

pub async fn complete_all(
    Store(store): Store,
    Path(list_id): Path<ListId>,
) -> Result<Response, AppError> {
    let list = resolve_list(store.as_ref(), list_id).await?;
    store.complete_all(list.id).await?;
    tracing::info!(list_id, "all todos completed");

    Ok((
        Flash::success("All todos have been completed."),
        Redirect::to(&list_path(list.id)),
    )
        .into_response())
}
