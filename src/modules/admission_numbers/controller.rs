use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use admitrack_core::{AppError, ErrorResponse};

use crate::modules::admission_numbers::model::{
    AdmissionNumberExists, AdmissionNumberExistsQuery, AdmissionNumberParts, AdmissionNumberQuery,
    AdmissionNumberValidity, GeneratedAdmissionNumber, NextAdmissionNumberResponse,
    RegenerateAdmissionNumbersDto, RegenerationSummary,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/admission-numbers/next",
    params(AdmissionNumberQuery),
    responses(
        (status = 200, description = "Next admission number, or an \"Error: ...\" message", body = NextAdmissionNumberResponse)
    ),
    tag = "Admission Numbers"
)]
#[instrument(skip(state))]
pub async fn preview_next_admission_number(
    State(state): State<AppState>,
    Query(query): Query<AdmissionNumberQuery>,
) -> Json<NextAdmissionNumberResponse> {
    let next_admission_number = state
        .allocator
        .preview_next(query.course_id, query.academic_year_id)
        .await;

    Json(NextAdmissionNumberResponse {
        next_admission_number,
    })
}

#[utoipa::path(
    get,
    path = "/api/admission-numbers/generate",
    params(AdmissionNumberQuery),
    responses(
        (status = 200, description = "Next admission number and serial (not reserved)", body = GeneratedAdmissionNumber),
        (status = 404, description = "Course or academic year not found", body = ErrorResponse),
        (status = 422, description = "Course capacity exhausted", body = ErrorResponse),
        (status = 500, description = "Course code does not match its format", body = ErrorResponse)
    ),
    tag = "Admission Numbers"
)]
#[instrument(skip(state))]
pub async fn generate_admission_number(
    State(state): State<AppState>,
    Query(query): Query<AdmissionNumberQuery>,
) -> Result<Json<GeneratedAdmissionNumber>, AppError> {
    let generated = state
        .allocator
        .generate(query.course_id, query.academic_year_id)
        .await
        .map_err(|e| e.into_app_error())?;

    Ok(Json(generated))
}

#[utoipa::path(
    get,
    path = "/api/admission-numbers/{number}/validate",
    params(
        ("number" = String, Path, description = "Admission number, e.g. 2024CS001")
    ),
    responses(
        (status = 200, description = "Whether the number resolves to a known course", body = AdmissionNumberValidity)
    ),
    tag = "Admission Numbers"
)]
#[instrument(skip(state))]
pub async fn validate_admission_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<AdmissionNumberValidity>, AppError> {
    let is_valid = state
        .allocator
        .validate(&number)
        .await
        .map_err(|e| e.into_app_error())?;

    Ok(Json(AdmissionNumberValidity {
        admission_number: number,
        is_valid,
    }))
}

#[utoipa::path(
    get,
    path = "/api/admission-numbers/{number}",
    params(
        ("number" = String, Path, description = "Admission number, e.g. 2024CS001")
    ),
    responses(
        (status = 200, description = "Decoded admission number", body = AdmissionNumberParts),
        (status = 404, description = "Number does not resolve to a known course", body = ErrorResponse)
    ),
    tag = "Admission Numbers"
)]
#[instrument(skip(state))]
pub async fn parse_admission_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<AdmissionNumberParts>, AppError> {
    let parts = state
        .allocator
        .parse(&number)
        .await
        .map_err(|e| e.into_app_error())?
        .ok_or_else(|| {
            AppError::not_found(anyhow::anyhow!(
                "Admission number {} does not match any course",
                number
            ))
        })?;

    Ok(Json(parts))
}

#[utoipa::path(
    get,
    path = "/api/admission-numbers/{number}/exists",
    params(
        ("number" = String, Path, description = "Admission number, e.g. 2024CS001"),
        AdmissionNumberExistsQuery
    ),
    responses(
        (status = 200, description = "Whether a student holds this number", body = AdmissionNumberExists)
    ),
    tag = "Admission Numbers"
)]
#[instrument(skip(state))]
pub async fn admission_number_exists(
    State(state): State<AppState>,
    Path(number): Path<String>,
    Query(query): Query<AdmissionNumberExistsQuery>,
) -> Result<Json<AdmissionNumberExists>, AppError> {
    let exists = state
        .allocator
        .exists(&number, query.exclude_student_id)
        .await
        .map_err(|e| e.into_app_error())?;

    Ok(Json(AdmissionNumberExists {
        admission_number: number,
        exists,
    }))
}

#[utoipa::path(
    post,
    path = "/api/admission-numbers/regenerate",
    request_body = RegenerateAdmissionNumbersDto,
    responses(
        (status = 200, description = "Renumbering summary", body = RegenerationSummary),
        (status = 400, description = "Missing confirmation", body = ErrorResponse),
        (status = 404, description = "Academic year or course not found", body = ErrorResponse),
        (status = 409, description = "Atomic renumbering collided and was rolled back", body = ErrorResponse)
    ),
    tag = "Admission Numbers"
)]
#[instrument(skip(state))]
pub async fn regenerate_admission_numbers(
    State(state): State<AppState>,
    Json(dto): Json<RegenerateAdmissionNumbersDto>,
) -> Result<Json<RegenerationSummary>, AppError> {
    if !dto.confirm {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "Regeneration rewrites existing admission numbers; set \"confirm\": true to proceed"
        )));
    }

    let mode = dto
        .mode
        .unwrap_or(state.allocator.config().regeneration_mode);
    let summary = state
        .allocator
        .regenerate_for_year_with_mode(dto.academic_year_id, dto.course_id, mode)
        .await
        .map_err(|e| e.into_app_error())?;

    Ok(Json(summary))
}
