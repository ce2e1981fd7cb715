use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Message returned to the caller for every failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Service error.
///
/// Variants keep the origin of a failure for server-side logs only. Every
/// variant renders the same response: `500 {"error": "Internal server error"}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Invalid id: {0}")]
    InvalidId(anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::InvalidId(_) => "invalid_id",
            AppError::DatabaseError(_) => "database",
            AppError::InternalError(_) => "internal",
            AppError::ConfigError(_) => "config",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl From<mongodb::bson::oid::Error> for AppError {
    fn from(err: mongodb::bson::oid::Error) -> Self {
        AppError::InvalidId(anyhow::Error::new(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(anyhow::anyhow!(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        tracing::error!(kind = self.kind(), error = %self, "Request failed");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: INTERNAL_ERROR_MESSAGE,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn every_variant_renders_the_same_response() {
        let errors = vec![
            AppError::BadRequest(anyhow::anyhow!("expected value at line 1")),
            AppError::InvalidId(anyhow::anyhow!("not-an-id")),
            AppError::DatabaseError(anyhow::anyhow!("connection refused")),
            AppError::InternalError(anyhow::anyhow!("boom")),
            AppError::ConfigError(anyhow::anyhow!("missing")),
        ];

        for error in errors {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = body_json(response).await;
            assert_eq!(body, serde_json::json!({ "error": "Internal server error" }));
        }
    }

    #[test]
    fn invalid_object_id_maps_to_invalid_id() {
        let err = mongodb::bson::oid::ObjectId::parse_str("nope").unwrap_err();
        let app_error = AppError::from(err);
        assert_eq!(app_error.kind(), "invalid_id");
    }
}
