pub mod health;
pub mod todos;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use todos::{
    create_todo, delete_todo, list_todos, list_todos_by_username, update_todo,
    update_todo_completed,
};
