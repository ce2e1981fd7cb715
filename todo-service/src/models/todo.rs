use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::{Deserialize, Deserializer, Serialize};
use service_core::error::AppError;

/// A user-supplied field: `None` when it was left out, `Some(None)` when it
/// was sent (or stored) as `null`.
pub type Field<T> = Option<Option<T>>;

/// Deserializes a [`Field`], keeping an explicit `null` apart from a missing
/// key. Pair with `#[serde(default)]`.
pub fn deserialize_field<'de, T, D>(deserializer: D) -> Result<Field<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A todo document as stored in the collection.
///
/// The collection is schemaless: fields left out at creation are not stored,
/// fields sent as `null` are stored as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Todo {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
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

impl Todo {
    /// Builds a new document with a freshly generated id.
    pub fn new(username: Field<String>, todo: Field<String>, completed: Field<bool>) -> Self {
        Self {
            id: Some(ObjectId::new()),
            username,
            todo,
            completed,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_ref().and_then(|u| u.as_deref())
    }

    pub fn apply(&mut self, patch: &TodoPatch) {
        if let Some(todo) = &patch.todo {
            self.todo = Some(todo.clone());
        }
        if let Some(completed) = patch.completed {
            self.completed = Some(completed);
        }
    }
}

/// Partial update: fields that were sent overwrite the stored ones, `null`
/// included; fields left out are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoPatch {
    pub todo: Field<String>,
    pub completed: Field<bool>,
}

fn or_null<T: Into<Bson>>(value: Option<T>) -> Bson {
    value.map_or(Bson::Null, Into::into)
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.todo.is_none() && self.completed.is_none()
    }

    /// `$set` update document containing only the fields that were sent.
    pub fn to_update_document(&self) -> Document {
        let mut set = Document::new();
        if let Some(todo) = &self.todo {
            set.insert("todo", or_null(todo.clone()));
        }
        if let Some(completed) = self.completed {
            set.insert("completed", or_null(completed));
        }
        doc! { "$set": set }
    }
}

/// Parses a path id into an ObjectId. Malformed ids are an error like any other.
pub fn parse_todo_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|e| {
        tracing::warn!(id = %id, "Rejected malformed todo id: {}", e);
        AppError::from(e)
    })
}
