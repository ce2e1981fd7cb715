use crate::models::{parse_todo_id, Todo, TodoPatch};
use crate::services::store::TodoStore;
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process store with the same observable behaviour as [`super::TodoDb`]:
/// insertion order, ObjectId ids, merge updates and malformed-id failures.
#[derive(Clone, Default)]
pub struct MemoryTodoStore {
    todos: Arc<RwLock<Vec<Todo>>>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn find_all(&self) -> Result<Vec<Todo>, AppError> {
        Ok(self.todos.read().await.clone())
    }

    async fn find_by_username(&self, username: &str) -> Result<Vec<Todo>, AppError> {
        Ok(self
            .todos
            .read()
            .await
            .iter()
            .filter(|todo| todo.username() == Some(username))
            .cloned()
            .collect())
    }

    async fn insert(&self, todo: Todo) -> Result<Todo, AppError> {
        self.todos.write().await.push(todo.clone());
        Ok(todo)
    }

    async fn update(&self, id: &str, patch: TodoPatch) -> Result<Option<Todo>, AppError> {
        let oid = parse_todo_id(id)?;
        let mut todos = self.todos.write().await;
        Ok(todos
            .iter_mut()
            .find(|todo| todo.id == Some(oid))
            .map(|todo| {
                todo.apply(&patch);
                todo.clone()
            }))
    }

    async fn delete(&self, id: &str) -> Result<Option<Todo>, AppError> {
        let oid = parse_todo_id(id)?;
        let mut todos = self.todos.write().await;
        Ok(todos
            .iter()
            .position(|todo| todo.id == Some(oid))
            .map(|index| todos.remove(index)))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
