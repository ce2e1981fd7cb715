//! Application startup and lifecycle management.

use crate::config::{StoreBackend, TodoConfig};
use crate::handlers;
use crate::services::{MemoryTodoStore, TodoDb, TodoStore};
use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: TodoConfig,
    pub store: Arc<dyn TodoStore>,
}

/// Builds the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todos/:id",
            get(handlers::list_todos_by_username)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .route(
            "/todos/:id/completed",
            put(handlers::update_todo_completed),
        )
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Opens the store selected by the configuration. The connection is made once
/// and held for the lifetime of the process.
pub async fn connect_store(config: &TodoConfig) -> Result<Arc<dyn TodoStore>, AppError> {
    match config.store {
        StoreBackend::Mongo => {
            let uri = config.mongodb.uri.as_deref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "MONGODB_ATLAS_CONNECTION_STRING is required for the mongo store"
                ))
            })?;

            let db = TodoDb::connect(
                uri,
                config.mongodb.database.as_deref(),
                &config.mongodb.collection,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;

            // Best effort: lookups by username work without the index.
            if let Err(e) = db.initialize_indexes().await {
                tracing::warn!("Continuing without todo indexes: {}", e);
            }

            Ok(Arc::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory todo store; data is lost on restart");
            Ok(Arc::new(MemoryTodoStore::new()))
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connects the configured store and binds the listener.
    pub async fn build(config: TodoConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        Self::build_with_store(config, store).await
    }

    /// Binds the listener around an already opened store.
    pub async fn build_with_store(
        config: TodoConfig,
        store: Arc<dyn TodoStore>,
    ) -> Result<Self, AppError> {
        // Port 0 = random port for testing
        let addr = config.common.bind_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Server started on port {}", port);

        Ok(Self {
            port,
            listener,
            state: AppState { config, store },
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn store(&self) -> Arc<dyn TodoStore> {
        self.state.store.clone()
    }

    /// Serves requests until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let app = router(self.state);
        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}
