//! Integration tests for fieldwise-axum.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::post,
};
use fieldwise::{Engine, Ty, record};
use fieldwise_axum::Parsed;
use tower::ServiceExt;

record! {
    #[derive(Debug)]
    struct InputSample {
        id: i64,
    }
}

record! {
    #[derive(Debug)]
    struct Visitor {
        age: u8,
    }
}

record! {
    #[derive(Debug)]
    struct Broken {
        id: i64,
        either: Either = Either,
    }
}

/// A field type no parser can handle.
#[derive(Debug)]
struct Either;

impl fieldwise::Describe for Either {
    fn describe() -> Ty {
        Ty::union([Ty::int(), Ty::String])
    }
}

impl fieldwise::FromValue for Either {
    fn from_value(_: fieldwise::Value) -> Result<Self, fieldwise::ConvertError> {
        Ok(Either)
    }
}

async fn sample(Parsed(input): Parsed<InputSample>) -> String {
    format!("id={}", input.id)
}

async fn visitor(Parsed(input): Parsed<Visitor>) -> String {
    format!("age={}", input.age)
}

async fn broken(Parsed(input): Parsed<Broken>) -> String {
    format!("{input:?}")
}

fn app() -> Router {
    Router::new()
        .route("/", post(sample))
        .route("/visitor", post(visitor))
        .route("/broken", post(broken))
        .with_state(Arc::new(Engine::new()))
}

async fn send(request: Request<Body>) -> (StatusCode, String) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn json_body() {
    fieldwise_testhelpers::setup();
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"id": 10}"#))
        .unwrap();
    assert_eq!(send(request).await, (StatusCode::OK, "id=10".to_string()));
}

#[tokio::test]
async fn query_string() {
    fieldwise_testhelpers::setup();
    let request = Request::builder()
        .method("POST")
        .uri("/?id=10")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(request).await, (StatusCode::OK, "id=10".to_string()));
}

#[tokio::test]
async fn form_body() {
    fieldwise_testhelpers::setup();
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("id=10"))
        .unwrap();
    assert_eq!(send(request).await, (StatusCode::OK, "id=10".to_string()));
}

#[tokio::test]
async fn query_overrides_json() {
    fieldwise_testhelpers::setup();
    let request = Request::builder()
        .method("POST")
        .uri("/?id=7")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"id": 10}"#))
        .unwrap();
    assert_eq!(send(request).await, (StatusCode::OK, "id=7".to_string()));
}

#[tokio::test]
async fn data_defects_are_unprocessable() {
    fieldwise_testhelpers::setup();
    let request = Request::builder()
        .method("POST")
        .uri("/?id=ten")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("at id:"), "{body}");

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("field `id` missing"), "{body}");
}

#[tokio::test]
async fn out_of_range_integers_are_unprocessable() {
    fieldwise_testhelpers::setup();
    let request = Request::builder()
        .method("POST")
        .uri("/visitor")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"age": 300}"#))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("at age:"), "{body}");

    let request = Request::builder()
        .method("POST")
        .uri("/visitor?age=42")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(request).await, (StatusCode::OK, "age=42".to_string()));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    fieldwise_testhelpers::setup();
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"id\": "))
        .unwrap();
    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn schema_defects_are_server_errors() {
    fieldwise_testhelpers::setup();
    let request = Request::builder()
        .method("POST")
        .uri("/broken?id=1&either=2")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("unions of this shape are not allowed"), "{body}");
}
