use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use admitrack_core::{AppError, ErrorResponse};
use admitrack_models::ids::CourseId;

use crate::modules::courses::model::{
    Course, CourseFilterParams, CourseWithStats, CreateCourseDto, UpdateCourseDto,
};
use crate::modules::courses::service::CourseService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a new course
#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created successfully", body = Course),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 409, description = "Course code already in use", body = ErrorResponse),
        (status = 422, description = "Course code does not fit its format", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn create_course(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = CourseService::create_course(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// List courses with enrolment counts
#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseFilterParams),
    responses(
        (status = 200, description = "List of courses", body = Vec<CourseWithStats>)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_courses(
    State(state): State<AppState>,
    Query(filters): Query<CourseFilterParams>,
) -> Result<Json<Vec<CourseWithStats>>, AppError> {
    let courses = CourseService::get_courses(&state.db, filters).await?;
    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(
        ("id" = CourseId, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course details", body = CourseWithStats),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course_by_id(
    State(state): State<AppState>,
    Path(id): Path<CourseId>,
) -> Result<Json<CourseWithStats>, AppError> {
    let course = CourseService::get_course_by_id(&state.db, id).await?;
    Ok(Json(course))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(
        ("id" = CourseId, Path, description = "Course ID")
    ),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated successfully", body = Course),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Code in use, or numbering frozen by enrolled students", body = ErrorResponse),
        (status = 422, description = "Course code does not fit its format", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<CourseId>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::update_course(&state.db, id, dto).await?;
    Ok(Json(course))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(
        ("id" = CourseId, Path, description = "Course ID")
    ),
    responses(
        (status = 204, description = "Course deleted successfully"),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Students are enrolled in the course", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<CourseId>,
) -> Result<StatusCode, AppError> {
    CourseService::delete_course(&state.db, id).await?;
    state.allocator.forget_course(id);
    Ok(StatusCode::NO_CONTENT)
}
