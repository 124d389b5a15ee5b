use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use admitrack_core::{AppError, ErrorResponse};
use admitrack_models::ids::StudentId;

use crate::modules::students::model::{
    CreateStudentDto, PaginatedStudentsResponse, StudentFilterParams, StudentWithRelations,
    UpdateStudentDto,
};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Admit a student
///
/// Without `admission_no` the next automatic number for the course and
/// academic year is assigned.
#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudentDto,
    responses(
        (status = 201, description = "Student admitted", body = StudentWithRelations),
        (status = 404, description = "Course or academic year not found", body = ErrorResponse),
        (status = 409, description = "Admission number already taken", body = ErrorResponse),
        (status = 422, description = "Invalid input, manual number mismatch, or course capacity exhausted", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn create_student(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateStudentDto>,
) -> Result<(StatusCode, Json<StudentWithRelations>), AppError> {
    let student = StudentService::create_student(&state.db, &state.allocator, dto).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "Paginated students, newest admission numbers first", body = PaginatedStudentsResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_students(
    State(state): State<AppState>,
    Query(filters): Query<StudentFilterParams>,
) -> Result<Json<PaginatedStudentsResponse>, AppError> {
    let students = StudentService::get_students(&state.db, filters).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(
        ("id" = StudentId, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student details", body = StudentWithRelations),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_student_by_id(
    State(state): State<AppState>,
    Path(id): Path<StudentId>,
) -> Result<Json<StudentWithRelations>, AppError> {
    let student = StudentService::get_student_by_id(&state.db, id).await?;
    Ok(Json(student))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    params(
        ("id" = StudentId, Path, description = "Student ID")
    ),
    request_body = UpdateStudentDto,
    responses(
        (status = 200, description = "Student updated", body = StudentWithRelations),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 409, description = "Admission number already taken", body = ErrorResponse),
        (status = 422, description = "Invalid input or admission number not editable", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<StudentId>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<StudentWithRelations>, AppError> {
    let student = StudentService::update_student(&state.db, &state.allocator, id, dto).await?;
    Ok(Json(student))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(
        ("id" = StudentId, Path, description = "Student ID")
    ),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<StudentId>,
) -> Result<StatusCode, AppError> {
    StudentService::delete_student(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
