mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::{admit_student, create_academic_year, create_course, send, setup_test_app};

#[sqlx::test(migrations = "./migrations")]
async fn test_create_course_uppercases_code(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/courses",
        Some(json!({
            "course_name": "Computer Science",
            "course_code": "cs",
            "type": "UG",
            "year": 3
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["course_code"], "CS");
    assert_eq!(body["is_special_format"], false);
    assert_eq!(body["type"], "UG");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_course_code_must_fit_format(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/courses",
        Some(json!({
            "course_name": "Computer Science and Engineering",
            "course_code": "CSE",
            "is_special_format": false,
            "type": "UG",
            "year": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("2 characters"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/courses",
        Some(json!({
            "course_name": "Computer Science",
            "course_code": "C$",
            "type": "UG",
            "year": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_course_missing_field(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/courses",
        Some(json!({ "course_name": "Computer Science", "type": "UG", "year": 3 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "course_code is required");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_course_code_conflicts(pool: PgPool) {
    let app = setup_test_app(pool);
    create_course(&app, "CS", false).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/courses",
        Some(json!({
            "course_name": "Another",
            "course_code": "CS",
            "type": "UG",
            "year": 3
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_and_get_courses(pool: PgPool) {
    let app = setup_test_app(pool);
    let cs = create_course(&app, "CS", false).await;
    create_course(&app, "MBA", true).await;

    let (status, body) = send(&app, "GET", "/api/courses", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&app, "GET", "/api/courses?search=mba", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["course_code"], "MBA");

    let (status, body) = send(&app, "GET", &format!("/api/courses/{cs}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course_code"], "CS");
    assert_eq!(body["student_count"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_unknown_course_not_found(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "GET",
        "/api/courses/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Course not found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_course(pool: PgPool) {
    let app = setup_test_app(pool);
    let cs = create_course(&app, "CS", false).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/courses/{cs}"),
        Some(json!({ "course_code": "CSE", "is_special_format": true })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course_code"], "CSE");
    assert_eq!(body["is_special_format"], true);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_course_numbering_frozen_once_students_enrolled(pool: PgPool) {
    let app = setup_test_app(pool);
    let cs = create_course(&app, "CS", false).await;
    let year = create_academic_year(&app, "2024-2025").await;
    let (status, _) = admit_student(&app, &cs, &year, "Adams", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/courses/{cs}"),
        Some(json!({ "course_code": "CO" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "DELETE", &format!("/api/courses/{cs}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_course(pool: PgPool) {
    let app = setup_test_app(pool);
    let cs = create_course(&app, "CS", false).await;

    let (status, _) = send(&app, "DELETE", &format!("/api/courses/{cs}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/courses/{cs}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
