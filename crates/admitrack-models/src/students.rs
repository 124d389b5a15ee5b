//! Student domain models and DTOs.

use crate::ids::{AcademicYearId, CourseId, StudentId};
use admitrack_core::{PaginationMeta, PaginationParams};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// How a student's admission number was assigned.
///
/// Only `Auto` serials take part in next-serial computation and bulk
/// renumbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "serial_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SerialSource {
    Auto,
    Manual,
}

impl SerialSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: StudentId,
    pub course_id: CourseId,
    pub academic_year_id: AcademicYearId,
    pub admission_no: String,
    pub serial_no: i32,
    pub serial_source: SerialSource,
    pub surname: String,
    pub student_name: String,
    pub father_name: Option<String>,
    pub date_of_admission: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Student row joined with its course and academic year labels.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentWithRelations {
    pub id: StudentId,
    pub course_id: CourseId,
    pub course_code: String,
    pub course_name: String,
    pub academic_year_id: AcademicYearId,
    pub academic_year: String,
    pub admission_no: String,
    pub serial_no: i32,
    pub serial_source: SerialSource,
    pub surname: String,
    pub student_name: String,
    pub father_name: Option<String>,
    pub date_of_admission: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fully numbered student ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudentRecord {
    pub course_id: CourseId,
    pub academic_year_id: AcademicYearId,
    pub admission_no: String,
    pub serial_no: i32,
    pub serial_source: SerialSource,
    pub surname: String,
    pub student_name: String,
    pub father_name: Option<String>,
    pub date_of_admission: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStudentDto {
    pub course_id: CourseId,
    pub academic_year_id: AcademicYearId,
    #[validate(length(min = 1, max = 100))]
    pub surname: String,
    #[validate(length(min = 1, max = 100))]
    pub student_name: String,
    #[validate(length(max = 100))]
    pub father_name: Option<String>,
    /// Defaults to today
    pub date_of_admission: Option<NaiveDate>,
    /// Manually assigned admission number; generated when absent
    #[validate(length(equal = 9))]
    pub admission_no: Option<String>,
}

/// Edits never regenerate a number. `admission_no` is only accepted for
/// students whose number was assigned manually.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentDto {
    #[validate(length(min = 1, max = 100))]
    pub surname: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub student_name: Option<String>,
    #[validate(length(max = 100))]
    pub father_name: Option<String>,
    pub date_of_admission: Option<NaiveDate>,
    #[validate(length(equal = 9))]
    pub admission_no: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct StudentFilterParams {
    /// Substring of surname, student name or admission number
    pub search: Option<String>,
    pub course_id: Option<CourseId>,
    pub academic_year_id: Option<AcademicYearId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedStudentsResponse {
    pub data: Vec<StudentWithRelations>,
    pub meta: PaginationMeta,
}
