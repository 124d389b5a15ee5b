use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use admitrack_core::{AppError, ErrorResponse};
use admitrack_models::ids::AcademicYearId;

use crate::modules::academic_years::model::{
    AcademicYear, AcademicYearWithStats, CreateAcademicYearDto, UpdateAcademicYearDto,
};
use crate::modules::academic_years::service::AcademicYearService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a new academic year
#[utoipa::path(
    post,
    path = "/api/academic-years",
    request_body = CreateAcademicYearDto,
    responses(
        (status = 201, description = "Academic year created successfully", body = AcademicYear),
        (status = 409, description = "Academic year already exists", body = ErrorResponse),
        (status = 422, description = "Label is not a valid YYYY-YYYY span", body = ErrorResponse)
    ),
    tag = "Academic Years"
)]
#[instrument(skip(state))]
pub async fn create_academic_year(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateAcademicYearDto>,
) -> Result<(StatusCode, Json<AcademicYear>), AppError> {
    let academic_year = AcademicYearService::create_academic_year(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(academic_year)))
}

/// List academic years, newest first
#[utoipa::path(
    get,
    path = "/api/academic-years",
    responses(
        (status = 200, description = "List of academic years", body = Vec<AcademicYearWithStats>)
    ),
    tag = "Academic Years"
)]
#[instrument(skip(state))]
pub async fn get_academic_years(
    State(state): State<AppState>,
) -> Result<Json<Vec<AcademicYearWithStats>>, AppError> {
    let years = AcademicYearService::get_academic_years(&state.db).await?;
    Ok(Json(years))
}

#[utoipa::path(
    get,
    path = "/api/academic-years/{id}",
    params(
        ("id" = AcademicYearId, Path, description = "Academic year ID")
    ),
    responses(
        (status = 200, description = "Academic year details", body = AcademicYearWithStats),
        (status = 404, description = "Academic year not found", body = ErrorResponse)
    ),
    tag = "Academic Years"
)]
#[instrument(skip(state))]
pub async fn get_academic_year_by_id(
    State(state): State<AppState>,
    Path(id): Path<AcademicYearId>,
) -> Result<Json<AcademicYearWithStats>, AppError> {
    let academic_year = AcademicYearService::get_academic_year_by_id(&state.db, id).await?;
    Ok(Json(academic_year))
}

#[utoipa::path(
    put,
    path = "/api/academic-years/{id}",
    params(
        ("id" = AcademicYearId, Path, description = "Academic year ID")
    ),
    request_body = UpdateAcademicYearDto,
    responses(
        (status = 200, description = "Academic year updated successfully", body = AcademicYear),
        (status = 404, description = "Academic year not found", body = ErrorResponse),
        (status = 409, description = "Label in use, or starting year frozen by enrolled students", body = ErrorResponse),
        (status = 422, description = "Label is not a valid YYYY-YYYY span", body = ErrorResponse)
    ),
    tag = "Academic Years"
)]
#[instrument(skip(state))]
pub async fn update_academic_year(
    State(state): State<AppState>,
    Path(id): Path<AcademicYearId>,
    ValidatedJson(dto): ValidatedJson<UpdateAcademicYearDto>,
) -> Result<Json<AcademicYear>, AppError> {
    let academic_year = AcademicYearService::update_academic_year(&state.db, id, dto).await?;
    Ok(Json(academic_year))
}

#[utoipa::path(
    delete,
    path = "/api/academic-years/{id}",
    params(
        ("id" = AcademicYearId, Path, description = "Academic year ID")
    ),
    responses(
        (status = 204, description = "Academic year deleted successfully"),
        (status = 404, description = "Academic year not found", body = ErrorResponse),
        (status = 409, description = "Students are enrolled in the academic year", body = ErrorResponse)
    ),
    tag = "Academic Years"
)]
#[instrument(skip(state))]
pub async fn delete_academic_year(
    State(state): State<AppState>,
    Path(id): Path<AcademicYearId>,
) -> Result<StatusCode, AppError> {
    AcademicYearService::delete_academic_year(&state.db, id).await?;
    state.allocator.forget_academic_year(id);
    Ok(StatusCode::NO_CONTENT)
}
