use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::de::DeserializeOwned;
use service_core::error::AppError;

/// JSON body extractor for the todo routes.
///
/// A request without a body, or whose content type is not JSON, reads as an
/// empty object (`T::default()`). A JSON body that fails to parse or has
/// wrongly typed fields is rejected through [`AppError`], so it gets the same
/// response as every other failure.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = is_json(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;

        if !json || bytes.is_empty() {
            tracing::debug!(json, len = bytes.len(), "Reading request body as empty object");
            return Ok(JsonBody(T::default()));
        }

        let Json(value) = Json::<T>::from_bytes(&bytes)?;
        Ok(JsonBody(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Payload {
        todo: Option<String>,
    }

    async fn extract(content_type: Option<&str>, body: &'static str) -> Result<Payload, AppError> {
        let mut builder = axum::http::Request::builder().method("POST").uri("/todos");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let req = builder.body(Body::from(body)).unwrap();
        JsonBody::<Payload>::from_request(req, &()).await.map(|JsonBody(b)| b)
    }

    #[tokio::test]
    async fn parses_json_bodies() {
        let body = extract(Some("application/json"), r#"{"todo": "x"}"#)
            .await
            .unwrap();
        assert_eq!(body.todo.as_deref(), Some("x"));

        let body = extract(Some("application/merge-patch+json; charset=utf-8"), r#"{"todo": "y"}"#)
            .await
            .unwrap();
        assert_eq!(body.todo.as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn missing_body_reads_as_empty_object() {
        assert_eq!(extract(None, "").await.unwrap(), Payload::default());
        assert_eq!(
            extract(Some("application/json"), "").await.unwrap(),
            Payload::default()
        );
    }

    #[tokio::test]
    async fn non_json_content_type_reads_as_empty_object() {
        assert_eq!(
            extract(Some("text/plain"), r#"{"todo": "x"}"#).await.unwrap(),
            Payload::default()
        );
        assert_eq!(
            extract(None, "not json at all").await.unwrap(),
            Payload::default()
        );
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let err = extract(Some("application/json"), "{not json")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "bad_request");

        let err = extract(Some("application/json"), r#"{"todo": 5}"#)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "bad_request");
    }
}
