use crate::dtos::{CreateTodoRequest, TodoResponse, UpdateCompletedRequest, UpdateTodoRequest};
use crate::middleware::JsonBody;
use crate::models::{Todo, TodoPatch};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

fn to_responses(todos: Vec<Todo>) -> Vec<TodoResponse> {
    todos.into_iter().map(TodoResponse::from).collect()
}

pub async fn list_todos(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let todos = state.store.find_all().await?;
    Ok(Json(to_responses(todos)))
}

/// `GET /todos/:id` treats the segment as a username.
pub async fn list_todos_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let todos = state.store.find_by_username(&username).await?;
    Ok(Json(to_responses(todos)))
}

pub async fn create_todo(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateTodoRequest>,
) -> Result<impl IntoResponse, AppError> {
    let todo = state.store.insert(Todo::from(req)).await?;
    tracing::info!(id = ?todo.id, "Created todo");
    Ok((StatusCode::CREATED, Json(TodoResponse::from(todo))))
}

/// Responds `null` when no document has this id.
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateTodoRequest>,
) -> Result<impl IntoResponse, AppError> {
    apply_patch(&state, &id, TodoPatch::from(req)).await
}

pub async fn update_todo_completed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateCompletedRequest>,
) -> Result<impl IntoResponse, AppError> {
    apply_patch(&state, &id, TodoPatch::from(req)).await
}

async fn apply_patch(
    state: &AppState,
    id: &str,
    patch: TodoPatch,
) -> Result<Json<Option<TodoResponse>>, AppError> {
    let updated = state.store.update(id, patch).await?;
    Ok(Json(updated.map(TodoResponse::from)))
}

/// Deleting an id that matches nothing still answers 204.
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if state.store.delete(&id).await?.is_none() {
        tracing::debug!(id = %id, "Delete matched no todo");
    }
    Ok(StatusCode::NO_CONTENT)
}
