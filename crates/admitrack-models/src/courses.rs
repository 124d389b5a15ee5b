//! Course domain models and DTOs.
//!
//! A course owns a short code that appears verbatim in every admission number
//! issued for it. Its `is_special_format` flag fixes the code length and the
//! serial width, see [`CourseFormat`].

use crate::admission_numbers::CourseFormat;
use crate::ids::CourseId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub course_name: String,
    pub course_full_name: Option<String>,
    pub course_code: String,
    pub is_special_format: bool,
    /// Programme type, e.g. "UG" or "PG"
    #[serde(rename = "type")]
    pub course_type: String,
    /// Programme duration in years
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn format(&self) -> CourseFormat {
        CourseFormat::from_special_flag(self.is_special_format)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseWithStats {
    pub id: CourseId,
    pub course_name: String,
    pub course_full_name: Option<String>,
    pub course_code: String,
    pub is_special_format: bool,
    #[serde(rename = "type")]
    pub course_type: String,
    pub year: i32,
    pub student_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 1, max = 100))]
    pub course_name: String,
    #[validate(length(max = 255))]
    pub course_full_name: Option<String>,
    /// 2 characters for standard courses, 3 for special ones
    #[validate(length(min = 2, max = 3))]
    pub course_code: String,
    #[serde(default)]
    pub is_special_format: bool,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 20))]
    pub course_type: String,
    #[validate(range(min = 1, max = 6))]
    pub year: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(min = 1, max = 100))]
    pub course_name: Option<String>,
    #[validate(length(max = 255))]
    pub course_full_name: Option<String>,
    #[validate(length(min = 2, max = 3))]
    pub course_code: Option<String>,
    pub is_special_format: Option<bool>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 20))]
    pub course_type: Option<String>,
    #[validate(range(min = 1, max = 6))]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct CourseFilterParams {
    /// Case-insensitive match on name or code
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourseCodeError {
    #[error("Course code must contain only letters and digits")]
    NotAlphanumeric,
    #[error("Course code must be exactly {expected} characters for {format} courses")]
    WrongLength {
        expected: usize,
        format: &'static str,
    },
}

/// Uppercases a course code and checks it against the numbering format.
pub fn normalize_course_code(code: &str, format: CourseFormat) -> Result<String, CourseCodeError> {
    let code = code.trim().to_uppercase();
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CourseCodeError::NotAlphanumeric);
    }
    if code.len() != format.code_len() {
        return Err(CourseCodeError::WrongLength {
            expected: format.code_len(),
            format: if format.is_special() {
                "special format"
            } else {
                "standard"
            },
        });
    }
    Ok(code)
}
