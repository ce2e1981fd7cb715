#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use std::sync::Arc;
use todo_service::config::{MongoConfig, StoreBackend, TodoConfig};
use todo_service::models::{Todo, TodoPatch};
use todo_service::services::{MemoryTodoStore, TodoDb, TodoStore};
use todo_service::startup::Application;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<dyn TodoStore>,
    pub client: reqwest::Client,
    pub mongo: Option<TodoDb>,
}

pub fn test_config(store: StoreBackend) -> TodoConfig {
    TodoConfig {
        common: CoreConfig {
            host: "127.0.0.1".parse().expect("valid loopback address"),
            port: 0,
        },
        mongodb: MongoConfig {
            uri: std::env::var("TEST_MONGODB_URI").ok(),
            database: Some(format!("todo_test_{}", unique_suffix())),
            collection: "todos".to_string(),
        },
        store,
    }
}

fn unique_suffix() -> String {
    mongodb::bson::oid::ObjectId::new().to_hex()
}

impl TestApp {
    /// Spawn the service on a random port backed by an in-memory store.
    pub async fn spawn() -> Self {
        Self::spawn_with_store(Arc::new(MemoryTodoStore::new())).await
    }

    pub async fn spawn_with_store(store: Arc<dyn TodoStore>) -> Self {
        let app = Application::build_with_store(test_config(StoreBackend::Memory), store)
            .await
            .expect("Failed to build test application");
        Self::start(app, None).await
    }

    /// Spawn the service against the MongoDB named by `TEST_MONGODB_URI`.
    pub async fn spawn_mongo() -> Self {
        let config = test_config(StoreBackend::Mongo);
        let db = TodoDb::connect(
            config.mongodb.uri.as_deref().expect("TEST_MONGODB_URI must be set"),
            config.mongodb.database.as_deref(),
            &config.mongodb.collection,
        )
        .await
        .expect("Failed to connect to MongoDB");

        let app = Application::build_with_store(config, Arc::new(db.clone()))
            .await
            .expect("Failed to build test application");
        Self::start(app, Some(db)).await
    }

    async fn start(app: Application, mongo: Option<TodoDb>) -> Self {
        let port = app.port();
        let store = app.store();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the readiness endpoint
        let client = reqwest::Client::new();
        let ready_url = format!("{}/ready", address);
        for _ in 0..50 {
            if client.get(&ready_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            store,
            client,
            mongo,
        }
    }

    /// Drop the per-test database, if any.
    pub async fn cleanup(&self) {
        if let Some(db) = &self.mongo {
            let _ = db.database().drop(None).await;
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_todo(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/todos"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Create a todo and return the response body.
    pub async fn create(&self, username: &str, todo: &str, completed: bool) -> Value {
        let response = self
            .create_todo(serde_json::json!({
                "username": username,
                "todo": todo,
                "completed": completed,
            }))
            .await;
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse JSON")
    }

    pub async fn list(&self, path: &str) -> Vec<Value> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.expect("Failed to parse JSON")
    }

    pub async fn put(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Store that fails every call, standing in for an unreachable database.
#[derive(Default)]
pub struct UnreachableStore;

fn store_unreachable() -> AppError {
    AppError::DatabaseError(anyhow::anyhow!("server selection timeout"))
}

#[async_trait]
impl TodoStore for UnreachableStore {
    async fn find_all(&self) -> Result<Vec<Todo>, AppError> {
        Err(store_unreachable())
    }

    async fn find_by_username(&self, _username: &str) -> Result<Vec<Todo>, AppError> {
        Err(store_unreachable())
    }

    async fn insert(&self, _todo: Todo) -> Result<Todo, AppError> {
        Err(store_unreachable())
    }

    async fn update(&self, _id: &str, _patch: TodoPatch) -> Result<Option<Todo>, AppError> {
        Err(store_unreachable())
    }

    async fn delete(&self, _id: &str) -> Result<Option<Todo>, AppError> {
        Err(store_unreachable())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Err(store_unreachable())
    }
}
