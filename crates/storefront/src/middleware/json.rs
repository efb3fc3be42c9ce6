//! JSON body extractor that rejects with [`AppError`].

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Like [`Json`], but a missing content type, malformed body or missing field
/// answers with the usual JSON error body instead of axum's plain text.
///
/// # Example
///
/// ```rust,ignore
/// async fn login(JsonBody(form): JsonBody<LoginForm>) -> impl IntoResponse {
///     // ...
/// }
/// ```
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header},
        response::IntoResponse,
        routing::post,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Deserialize)]
    struct Greeting {
        name: String,
    }

    async fn greet(JsonBody(greeting): JsonBody<Greeting>) -> impl IntoResponse {
        format!("Hello, {}", greeting.name)
    }

    async fn send(body: &'static str, content_type: Option<&str>) -> (StatusCode, String) {
        let app = Router::new().route("/", post(greet));
        let mut request = axum::http::Request::post("/");
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        let response = app
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_valid_body() {
        let (status, body) = send(r#"{"name":"Jon"}"#, Some("application/json")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Hello, Jon");
    }

    #[tokio::test]
    async fn test_missing_field_is_json_error() {
        let (status, body) = send("{}", Some("application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let (status, body) = send("{not json", Some("application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(serde_json::from_str::<serde_json::Value>(&body).unwrap()["error"].is_string());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_json_error() {
        let (status, body) = send(r#"{"name":"Jon"}"#, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(serde_json::from_str::<serde_json::Value>(&body).unwrap()["error"].is_string());
    }
}
