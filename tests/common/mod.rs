#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

use admitrack::router::init_router;
use admitrack::state::AppState;
use admitrack_config::{AllocatorConfig, CorsConfig};

pub fn setup_test_app(pool: PgPool) -> axum::Router {
    setup_test_app_with(pool, AllocatorConfig::default())
}

pub fn setup_test_app_with(pool: PgPool, allocator_config: AllocatorConfig) -> axum::Router {
    dotenvy::dotenv().ok();
    init_router(AppState::new(pool, allocator_config, CorsConfig::from_env()))
}

/// Sends a request and returns the status with the JSON body (`Null` when empty).
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub async fn create_course(app: &axum::Router, code: &str, special: bool) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/courses",
        Some(json!({
            "course_name": format!("Course {code}"),
            "course_code": code,
            "is_special_format": special,
            "type": "UG",
            "year": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

pub async fn create_academic_year(app: &axum::Router, label: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/academic-years",
        Some(json!({ "academic_year": label })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

pub async fn admit_student(
    app: &axum::Router,
    course_id: &str,
    academic_year_id: &str,
    surname: &str,
    admission_no: Option<&str>,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/students",
        Some(json!({
            "course_id": course_id,
            "academic_year_id": academic_year_id,
            "surname": surname,
            "student_name": "Test",
            "admission_no": admission_no
        })),
    )
    .await
}
