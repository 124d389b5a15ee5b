mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use admitrack_config::{AllocatorConfig, OverflowPolicy};
use common::{
    admit_student, create_academic_year, create_course, send, setup_test_app,
    setup_test_app_with,
};

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_does_not_reserve(pool: PgPool) {
    let app = setup_test_app(pool);
    let cs = create_course(&app, "CS", false).await;
    let year = create_academic_year(&app, "2024-2025").await;
    let uri = format!("/api/admission-numbers/generate?course_id={cs}&academic_year_id={year}");

    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admission_number"], "2024CS001");
    assert_eq!(body["serial_no"], 1);

    let (_, again) = send(&app, "GET", &uri, None).await;
    assert_eq!(again["admission_number"], "2024CS001");

    admit_student(&app, &cs, &year, "Adams", None).await;
    let (_, after) = send(&app, "GET", &uri, None).await;
    assert_eq!(after["admission_number"], "2024CS002");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_preview_reports_errors_inline(pool: PgPool) {
    let app = setup_test_app(pool);
    let cs = create_course(&app, "CS", false).await;
    let year = create_academic_year(&app, "2024-2025").await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/admission-numbers/next?course_id={cs}&academic_year_id={year}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["next_admission_number"], "2024CS001");

    let (status, body) = send(
        &app,
        "GET",
        &format!(
            "/api/admission-numbers/next?course_id={cs}&academic_year_id=00000000-0000-0000-0000-000000000000"
        ),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["next_admission_number"]
            .as_str()
            .unwrap()
            .starts_with("Error: ")
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_unknown_course_not_found(pool: PgPool) {
    let app = setup_test_app(pool);
    let year = create_academic_year(&app, "2024-2025").await;

    let (status, _) = send(
        &app,
        "GET",
        &format!(
            "/api/admission-numbers/generate?course_id=00000000-0000-0000-0000-000000000000&academic_year_id={year}"
        ),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_validate_and_parse(pool: PgPool) {
    let app = setup_test_app(pool);
    create_course(&app, "CS", false).await;
    create_course(&app, "CSE", true).await;

    let (status, body) = send(&app, "GET", "/api/admission-numbers/2024CS001/validate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_valid"], true);

    let (_, body) = send(&app, "GET", "/api/admission-numbers/2024CS1/validate", None).await;
    assert_eq!(body["is_valid"], false);

    let (status, body) = send(&app, "GET", "/api/admission-numbers/2024CSE01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course_code"], "CSE");
    assert_eq!(body["is_special_format"], true);
    assert_eq!(body["year"], 2024);
    assert_eq!(body["serial"], 1);
    assert_eq!(body["formatted_serial"], "01");

    let (status, body) = send(&app, "GET", "/api/admission-numbers/2024CS042", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course_code"], "CS");
    assert_eq!(body["serial"], 42);

    let (status, _) = send(&app, "GET", "/api/admission-numbers/2024XX999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_exists_with_exclusion(pool: PgPool) {
    let app = setup_test_app(pool);
    let cs = create_course(&app, "CS", false).await;
    let year = create_academic_year(&app, "2024-2025").await;

    let (_, body) = send(&app, "GET", "/api/admission-numbers/2024CS001/exists", None).await;
    assert_eq!(body["exists"], false);

    let (_, student) = admit_student(&app, &cs, &year, "Adams", None).await;
    let id = student["id"].as_str().unwrap();

    let (_, body) = send(&app, "GET", "/api/admission-numbers/2024CS001/exists", None).await;
    assert_eq!(body["exists"], true);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/admission-numbers/2024CS001/exists?exclude_student_id={id}"),
        None,
    )
    .await;
    assert_eq!(body["exists"], false);
}

async fn fill_special_course(pool: &PgPool, course_id: &str, year_id: &str) {
    sqlx::query(
        r#"INSERT INTO students (course_id, academic_year_id, admission_no, serial_no, surname, student_name)
           VALUES ($1::uuid, $2::uuid, '2024MBA99', 99, 'Last', 'Student')"#,
    )
    .bind(course_id)
    .bind(year_id)
    .execute(pool)
    .await
    .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn test_capacity_exhausted_rejected(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let mba = create_course(&app, "MBA", true).await;
    let year = create_academic_year(&app, "2024-2025").await;
    fill_special_course(&pool, &mba, &year).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/admission-numbers/generate?course_id={mba}&academic_year_id={year}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("MBA"));

    let (status, _) = admit_student(&app, &mba, &year, "Zed", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_capacity_overflow_allowed_with_warn_policy(pool: PgPool) {
    let app = setup_test_app_with(
        pool.clone(),
        AllocatorConfig::default().with_overflow_policy(OverflowPolicy::Warn),
    );
    let mba = create_course(&app, "MBA", true).await;
    let year = create_academic_year(&app, "2024-2025").await;
    fill_special_course(&pool, &mba, &year).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/admission-numbers/generate?course_id={mba}&academic_year_id={year}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admission_number"], "2024MBA100");
    assert_eq!(body["serial_no"], 100);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_regenerate_requires_confirmation(pool: PgPool) {
    let app = setup_test_app(pool);
    let year = create_academic_year(&app, "2024-2025").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/admission-numbers/regenerate",
        Some(json!({ "academic_year_id": year })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn numbers_by_surname(app: &axum::Router) -> Vec<(String, String)> {
    let (_, body) = send(app, "GET", "/api/students?limit=100", None).await;
    let mut numbers: Vec<(String, String)> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| {
            (
                s["surname"].as_str().unwrap().to_string(),
                s["admission_no"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    numbers.sort();
    numbers
}

#[sqlx::test(migrations = "./migrations")]
async fn test_regenerate_orders_by_surname(pool: PgPool) {
    let app = setup_test_app(pool);
    let cs = create_course(&app, "CS", false).await;
    let year = create_academic_year(&app, "2024-2025").await;
    for surname in ["Clark", "Adams", "Baker"] {
        admit_student(&app, &cs, &year, surname, None).await;
    }
    let (status, _) = admit_student(&app, &cs, &year, "Aaron", Some("2024CS500")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/admission-numbers/regenerate",
        Some(json!({ "academic_year_id": year, "confirm": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["updated"], 3);
    assert_eq!(body["unchanged"], 0);
    assert_eq!(body["failed"], 0);
    assert_eq!(body["mode"], "atomic");

    assert_eq!(
        numbers_by_surname(&app).await,
        vec![
            ("Aaron".to_string(), "2024CS500".to_string()),
            ("Adams".to_string(), "2024CS001".to_string()),
            ("Baker".to_string(), "2024CS002".to_string()),
            ("Clark".to_string(), "2024CS003".to_string()),
        ]
    );

    let (_, again) = send(
        &app,
        "POST",
        "/api/admission-numbers/regenerate",
        Some(json!({ "academic_year_id": year, "confirm": true })),
    )
    .await;
    assert_eq!(again["updated"], 0);
    assert_eq!(again["unchanged"], 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_regenerate_single_course(pool: PgPool) {
    let app = setup_test_app(pool);
    let cs = create_course(&app, "CS", false).await;
    let me = create_course(&app, "ME", false).await;
    let year = create_academic_year(&app, "2024-2025").await;
    for surname in ["Baker", "Adams"] {
        admit_student(&app, &cs, &year, surname, None).await;
    }
    for surname in ["Young", "Xu"] {
        admit_student(&app, &me, &year, surname, None).await;
    }

    let (status, body) = send(
        &app,
        "POST",
        "/api/admission-numbers/regenerate",
        Some(json!({ "academic_year_id": year, "course_id": cs, "confirm": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["updated"], 2);

    assert_eq!(
        numbers_by_surname(&app).await,
        vec![
            ("Adams".to_string(), "2024CS001".to_string()),
            ("Baker".to_string(), "2024CS002".to_string()),
            ("Xu".to_string(), "2024ME002".to_string()),
            ("Young".to_string(), "2024ME001".to_string()),
        ]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_regenerate_per_record_closes_gaps(pool: PgPool) {
    let app = setup_test_app(pool);
    let cs = create_course(&app, "CS", false).await;
    let year = create_academic_year(&app, "2024-2025").await;
    let (_, adams) = admit_student(&app, &cs, &year, "Adams", None).await;
    admit_student(&app, &cs, &year, "Baker", None).await;
    admit_student(&app, &cs, &year, "Clark", None).await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/students/{}", adams["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        "POST",
        "/api/admission-numbers/regenerate",
        Some(json!({ "academic_year_id": year, "confirm": true, "mode": "per_record" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["mode"], "per_record");
    assert_eq!(body["updated"], 2);
    assert_eq!(body["failed"], 0);

    assert_eq!(
        numbers_by_surname(&app).await,
        vec![
            ("Baker".to_string(), "2024CS001".to_string()),
            ("Clark".to_string(), "2024CS002".to_string()),
        ]
    );

    let (_, next) = send(
        &app,
        "GET",
        &format!("/api/admission-numbers/generate?course_id={cs}&academic_year_id={year}"),
        None,
    )
    .await;
    assert_eq!(next["admission_number"], "2024CS003");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_regenerate_unknown_year_not_found(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/admission-numbers/regenerate",
        Some(json!({
            "academic_year_id": "00000000-0000-0000-0000-000000000000",
            "confirm": true
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_health(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_regenerate_orders_names_byte_wise(pool: PgPool) {
    let app = setup_test_app(pool);
    let cs = create_course(&app, "CS", false).await;
    let year = create_academic_year(&app, "2024-2025").await;
    admit_student(&app, &cs, &year, "Mcallister", None).await;
    admit_student(&app, &cs, &year, "McDonald", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/admission-numbers/regenerate",
        Some(json!({ "academic_year_id": year, "confirm": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["updated"], 2);

    // Uppercase sorts before lowercase whatever the database collation.
    assert_eq!(
        numbers_by_surname(&app).await,
        vec![
            ("McDonald".to_string(), "2024CS001".to_string()),
            ("Mcallister".to_string(), "2024CS002".to_string()),
        ]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admission_after_atomic_regeneration_continues_from_students(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let cs = create_course(&app, "CS", false).await;
    let year = create_academic_year(&app, "2024-2025").await;
    let (_, adams) = admit_student(&app, &cs, &year, "Adams", None).await;
    admit_student(&app, &cs, &year, "Baker", None).await;
    admit_student(&app, &cs, &year, "Clark", None).await;
    send(
        &app,
        "DELETE",
        &format!("/api/students/{}", adams["id"].as_str().unwrap()),
        None,
    )
    .await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/admission-numbers/regenerate",
        Some(json!({ "academic_year_id": year, "confirm": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, student) = admit_student(&app, &cs, &year, "Young", None).await;
    assert_eq!(status, StatusCode::CREATED, "{student}");
    assert_eq!(student["admission_no"], "2024CS003");
    assert_eq!(student["serial_no"], 3);

    let lock_rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM admission_sequences WHERE course_id = $1::uuid AND academic_year_id = $2::uuid",
    )
    .bind(&cs)
    .bind(&year)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(lock_rows, 1);
}
