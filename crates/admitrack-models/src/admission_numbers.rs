//! Admission-number formatting rules and DTOs.
//!
//! An admission number is always nine characters:
//!
//! ```text
//! 2024 CS 001     standard course: 2-char code, 3-digit serial (0-999)
//! 2024 CSE 01     special course:  3-char code, 2-digit serial (0-99)
//! ```
//!
//! The string alone does not say which layout it uses, so [`layout_candidates`]
//! only proposes readings. Deciding between them needs the course table, which
//! the allocator consults.

use admitrack_config::RegenerationMode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::ids::{AcademicYearId, CourseId, StudentId};

pub const ADMISSION_NUMBER_LEN: usize = 9;
pub const YEAR_DIGITS: usize = 4;

/// Numbering layout of a course, derived from its `is_special_format` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourseFormat {
    /// 2-character code, 3-digit serial.
    Standard,
    /// 3-character code, 2-digit serial.
    Special,
}

impl CourseFormat {
    pub const fn from_special_flag(is_special_format: bool) -> Self {
        if is_special_format {
            Self::Special
        } else {
            Self::Standard
        }
    }

    pub const fn is_special(self) -> bool {
        matches!(self, Self::Special)
    }

    pub const fn code_len(self) -> usize {
        match self {
            Self::Standard => 2,
            Self::Special => 3,
        }
    }

    pub const fn serial_digits(self) -> usize {
        match self {
            Self::Standard => 3,
            Self::Special => 2,
        }
    }

    pub const fn max_serial(self) -> i32 {
        match self {
            Self::Standard => 999,
            Self::Special => 99,
        }
    }
}

/// Zero-pads a serial to the layout's width. Serials beyond the width are not
/// truncated, so an overflowing serial yields a longer string.
pub fn format_serial(format: CourseFormat, serial: i32) -> String {
    format!("{:0width$}", serial, width = format.serial_digits())
}

pub fn format_admission_number(
    starting_year: &str,
    course_code: &str,
    format: CourseFormat,
    serial: i32,
) -> String {
    format!(
        "{}{}{}",
        starting_year,
        course_code.to_uppercase(),
        format_serial(format, serial)
    )
}

/// One structural reading of an admission number, before any course lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutCandidate {
    pub format: CourseFormat,
    pub year: i32,
    pub course_code: String,
    pub serial: i32,
    pub formatted_serial: String,
}

impl LayoutCandidate {
    pub fn into_parts(self) -> AdmissionNumberParts {
        AdmissionNumberParts {
            course_code: self.course_code,
            is_special_format: self.format.is_special(),
            year: self.year,
            serial: self.serial,
            formatted_serial: self.formatted_serial,
        }
    }
}

/// Proposes the special reading first, then the standard one.
///
/// Returns an empty list unless the input is exactly nine ASCII characters
/// with a numeric year. A reading is dropped when its serial part is not
/// numeric, its serial exceeds the layout maximum, or its code part is not
/// alphanumeric. Codes are uppercased.
pub fn layout_candidates(admission_number: &str) -> Vec<LayoutCandidate> {
    if admission_number.len() != ADMISSION_NUMBER_LEN || !admission_number.is_ascii() {
        return Vec::new();
    }

    let (year_part, rest) = admission_number.split_at(YEAR_DIGITS);
    if !is_all_digits(year_part) {
        return Vec::new();
    }
    let Ok(year) = year_part.parse::<i32>() else {
        return Vec::new();
    };

    [CourseFormat::Special, CourseFormat::Standard]
        .into_iter()
        .filter_map(|format| {
            let (code, serial_part) = rest.split_at(format.code_len());
            if !code.chars().all(|c| c.is_ascii_alphanumeric()) || !is_all_digits(serial_part) {
                return None;
            }
            let serial = serial_part.parse::<i32>().ok()?;
            (serial <= format.max_serial()).then(|| LayoutCandidate {
                format,
                year,
                course_code: code.to_uppercase(),
                serial,
                formatted_serial: serial_part.to_string(),
            })
        })
        .collect()
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Course fields the allocator needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct CourseNumbering {
    pub id: CourseId,
    pub course_code: String,
    pub is_special_format: bool,
    #[serde(rename = "type")]
    pub course_type: String,
}

impl CourseNumbering {
    pub fn format(&self) -> CourseFormat {
        CourseFormat::from_special_flag(self.is_special_format)
    }

    /// Whether the stored code length agrees with the format flag.
    pub fn has_consistent_code(&self) -> bool {
        self.course_code.len() == self.format().code_len()
    }
}

/// Decoded components of a resolved admission number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AdmissionNumberParts {
    pub course_code: String,
    pub is_special_format: bool,
    pub year: i32,
    pub serial: i32,
    /// Serial exactly as written, with its zero padding
    pub formatted_serial: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GeneratedAdmissionNumber {
    pub admission_number: String,
    pub serial_no: i32,
}

/// Student row as seen by bulk renumbering.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RegenerationCandidate {
    pub id: StudentId,
    pub course_id: CourseId,
    pub course_code: String,
    pub is_special_format: bool,
    pub surname: String,
    pub student_name: String,
    pub admission_no: String,
    pub serial_no: i32,
}

/// A planned admission-number rewrite for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Renumbering {
    pub student_id: StudentId,
    pub admission_no: String,
    pub serial_no: i32,
}

/// A student to be admitted. Without `manual_admission_no` the next
/// automatic number is allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionRequest {
    pub course_id: CourseId,
    pub academic_year_id: AcademicYearId,
    pub surname: String,
    pub student_name: String,
    pub father_name: Option<String>,
    pub date_of_admission: NaiveDate,
    pub manual_admission_no: Option<String>,
}

/// Query parameters naming a course and academic year.
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct AdmissionNumberQuery {
    pub course_id: CourseId,
    pub academic_year_id: AcademicYearId,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct AdmissionNumberExistsQuery {
    /// Student to ignore, e.g. the one being edited
    pub exclude_student_id: Option<StudentId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NextAdmissionNumberResponse {
    /// The next number, or a message starting with "Error:" when it cannot be computed
    pub next_admission_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdmissionNumberValidity {
    pub admission_number: String,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdmissionNumberExists {
    pub admission_number: String,
    pub exists: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegenerateAdmissionNumbersDto {
    pub academic_year_id: AcademicYearId,
    /// Limit renumbering to one course
    pub course_id: Option<CourseId>,
    /// Must be `true`; renumbering rewrites existing records
    #[serde(default)]
    pub confirm: bool,
    /// Overrides the configured regeneration mode
    pub mode: Option<RegenerationMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RegenerationSummary {
    pub academic_year_id: AcademicYearId,
    pub course_id: Option<CourseId>,
    pub mode: RegenerationMode,
    /// Students whose number and serial were rewritten
    pub updated: u64,
    /// Students that already held their recomputed number
    pub unchanged: u64,
    /// Students left untouched because their serial overflowed or their course is misconfigured
    pub skipped: u64,
    /// Students whose update failed in per-record mode
    pub failed: u64,
}
