pub mod todo;

pub use todo::{deserialize_field, parse_todo_id, Field, Todo, TodoPatch};
