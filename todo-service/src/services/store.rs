use crate::models::{Todo, TodoPatch};
use async_trait::async_trait;
use service_core::error::AppError;

/// The five query shapes the service issues against the todo collection.
///
/// Ids are passed through as received on the path; implementations reject
/// malformed ids with [`AppError::InvalidId`]. A missing document is not an
/// error: `update` and `delete` return `Ok(None)`.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Todo>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Vec<Todo>, AppError>;

    async fn insert(&self, todo: Todo) -> Result<Todo, AppError>;

    /// Merges `patch` into the document and returns it as persisted afterwards.
    async fn update(&self, id: &str, patch: TodoPatch) -> Result<Option<Todo>, AppError>;

    async fn delete(&self, id: &str) -> Result<Option<Todo>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
