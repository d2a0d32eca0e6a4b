/// Request extractors that reject with [`ApiError`]
///
/// Drop-in replacements for `axum::Json`, `axum::extract::Path` and
/// `axum::extract::Query`. A body that is not valid JSON, misses a field or
/// carries an unknown enum value, a path segment that is not a UUID, and a
/// malformed query string all become a 400 with the usual
/// `{"error", "message"}` body instead of axum's plain-text rejection.

use axum::{
    extract::{FromRequest, FromRequestParts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::error::ApiError;

/// JSON body extractor and response
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use serde::Deserialize;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "lowercase")]
    enum Level {
        Low,
        High,
    }

    #[derive(Debug, Deserialize, Serialize)]
    struct Payload {
        title: String,
        level: Level,
    }

    #[derive(Debug, Deserialize)]
    struct Page {
        limit: Option<i64>,
    }

    fn router() -> Router {
        Router::new()
            .route("/items", post(|Json(payload): Json<Payload>| async move { Json(payload) }))
            .route(
                "/items/:id",
                get(|Path(id): Path<Uuid>| async move { id.to_string() }),
            )
            .route(
                "/page",
                get(|Query(page): Query<Page>| async move { page.limit.unwrap_or(0).to_string() }),
            )
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/items")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_round_trips() {
        let (status, body) = send(post_json(r#"{"title": "x", "level": "high"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["level"], "high");
    }

    #[tokio::test]
    async fn test_unknown_enum_value_is_bad_request() {
        let (status, body) = send(post_json(r#"{"title": "x", "level": "urgent"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
        assert!(body["message"].as_str().unwrap().contains("urgent"));
    }

    #[tokio::test]
    async fn test_missing_field_and_syntax_error_are_bad_request() {
        let (status, body) = send(post_json(r#"{"title": "x"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");

        let (status, _) = send(post_json("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/items")
            .body(Body::from(r#"{"title": "x", "level": "low"}"#))
            .unwrap();

        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_bad_path_and_query_are_bad_request() {
        let request = Request::builder().uri("/items/not-a-uuid").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");

        let request = Request::builder().uri("/page?limit=many").body(Body::empty()).unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let id = Uuid::new_v4();
        let request = Request::builder()
            .uri(format!("/items/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
