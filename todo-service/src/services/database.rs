use crate::models::{parse_todo_id, Todo, TodoPatch};
use crate::services::metrics::record_store_operation;
use crate::services::store::TodoStore;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

/// Database used when neither the configuration nor the connection string
/// names one.
pub const FALLBACK_DATABASE: &str = "test";

/// MongoDB-backed todo store. Cheap to clone; all clones share the driver's
/// connection pool.
#[derive(Clone)]
pub struct TodoDb {
    client: MongoClient,
    db: Database,
    collection: String,
}

impl TodoDb {
    pub async fn connect(
        uri: &str,
        database: Option<&str>,
        collection: &str,
    ) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;

        let db = match database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(FALLBACK_DATABASE)),
        };
        tracing::info!(
            database = %db.name(),
            collection = %collection,
            "Successfully connected to MongoDB database"
        );

        Ok(Self {
            client,
            db,
            collection: collection.to_string(),
        })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for todo-service");

        let username_index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(
                IndexOptions::builder()
                    .name("username_lookup".to_string())
                    .build(),
            )
            .build();

        self.todos().create_index(username_index, None).await?;
        tracing::info!("Created index on {}.username", self.collection);

        Ok(())
    }

    pub fn todos(&self) -> Collection<Todo> {
        self.db.collection(&self.collection)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn find(&self, filter: Option<Document>) -> Result<Vec<Todo>, AppError> {
        let cursor = self.todos().find(filter, None).await?;
        Ok(cursor.try_collect::<Vec<Todo>>().await?)
    }
}

fn observe<T>(operation: &'static str, result: Result<T, AppError>) -> Result<T, AppError> {
    match &result {
        Ok(_) => record_store_operation(operation, "ok"),
        Err(e) => {
            tracing::error!(operation, "Todo store operation failed: {}", e);
            record_store_operation(operation, "error");
        }
    }
    result
}

#[async_trait]
impl TodoStore for TodoDb {
    async fn find_all(&self) -> Result<Vec<Todo>, AppError> {
        tracing::debug!("Listing all todos");
        observe("find_all", self.find(None).await)
    }

    async fn find_by_username(&self, username: &str) -> Result<Vec<Todo>, AppError> {
        tracing::debug!(username = %username, "Listing todos by username");
        observe(
            "find_by_username",
            self.find(Some(doc! { "username": username })).await,
        )
    }

    async fn insert(&self, todo: Todo) -> Result<Todo, AppError> {
        let result = self
            .todos()
            .insert_one(&todo, None)
            .await
            .map(|inserted| {
                tracing::debug!(id = %inserted.inserted_id, "Inserted todo");
                todo
            })
            .map_err(AppError::from);
        observe("insert", result)
    }

    async fn update(&self, id: &str, patch: TodoPatch) -> Result<Option<Todo>, AppError> {
        let result: Result<Option<Todo>, AppError> = async {
            let oid = parse_todo_id(id)?;
            let filter = doc! { "_id": oid };

            // `$set` must not be empty; an empty patch is a plain lookup.
            if patch.is_empty() {
                return Ok(self.todos().find_one(filter, None).await?);
            }

            let options = FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            Ok(self
                .todos()
                .find_one_and_update(filter, patch.to_update_document(), options)
                .await?)
        }
        .await;

        if let Ok(None) = &result {
            tracing::debug!(id = %id, "Update matched no todo");
        }
        observe("update", result)
    }

    async fn delete(&self, id: &str) -> Result<Option<Todo>, AppError> {
        let result: Result<Option<Todo>, AppError> = async {
            let oid = parse_todo_id(id)?;
            Ok(self
                .todos()
                .find_one_and_delete(doc! { "_id": oid }, None)
                .await?)
        }
        .await;
        observe("delete", result)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}
