use crate::models::{deserialize_field, Field, Todo, TodoPatch};
use serde::{Deserialize, Serialize};

/// Body of `POST /todos`. Every field may be missing or null; a null is stored
/// as null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default, deserialize_with = "deserialize_field")]
    pub username: Field<String>,
    #[serde(default, deserialize_with = "deserialize_field")]
    pub todo: Field<String>,
    #[serde(default, deserialize_with = "deserialize_field")]
    pub completed: Field<bool>,
}

impl From<CreateTodoRequest> for Todo {
    fn from(req: CreateTodoRequest) -> Self {
        Todo::new(req.username, req.todo, req.completed)
    }
}

/// Body of `PUT /todos/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default, deserialize_with = "deserialize_field")]
    pub todo: Field<String>,
    #[serde(default, deserialize_with = "deserialize_field")]
    pub completed: Field<bool>,
}

impl From<UpdateTodoRequest> for TodoPatch {
    fn from(req: UpdateTodoRequest) -> Self {
        TodoPatch {
            todo: req.todo,
            completed: req.completed,
        }
    }
}

/// Body of `PUT /todos/:id/completed`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCompletedRequest {
    #[serde(default, deserialize_with = "deserialize_field")]
    pub completed: Field<bool>,
}

impl From<UpdateCompletedRequest> for TodoPatch {
    fn from(req: UpdateCompletedRequest) -> Self {
        TodoPatch {
            todo: None,
            completed: req.completed,
        }
    }
}

/// A stored todo as returned to clients. Fields missing from the document are
/// omitted, fields stored as null render as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoResponse {
    pub id: String,
    #[serde(
        default,
        deserialize_with = "deserialize_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub username: Field<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub todo: Field<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed: Field<bool>,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id.map(|id| id.to_hex()).unwrap_or_default(),
            username: todo.username,
            todo: todo.todo,
            completed: todo.completed,
        }
    }
}
