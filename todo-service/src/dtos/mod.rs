pub mod todos;

pub use todos::{CreateTodoRequest, TodoResponse, UpdateCompletedRequest, UpdateTodoRequest};
