//! Academic year domain models and DTOs.
//!
//! Academic years are labelled `"YYYY-YYYY"`. The four digits before the dash
//! are the starting year stamped into admission numbers.

use crate::ids::AcademicYearId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;
pub const MAX_SPAN: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    /// Label such as "2024-2025"
    pub academic_year: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AcademicYear {
    pub fn starting_year(&self) -> Option<&str> {
        starting_year(&self.academic_year)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AcademicYearWithStats {
    pub id: AcademicYearId,
    pub academic_year: String,
    pub student_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The text before the first `-`, when it is exactly four digits.
pub fn starting_year(label: &str) -> Option<&str> {
    let (start, _) = label.split_once('-')?;
    (start.len() == 4 && start.chars().all(|c| c.is_ascii_digit())).then_some(start)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcademicYearFormatError {
    #[error("Academic year must be in the format YYYY-YYYY")]
    Malformed,
    #[error("Academic year must fall between {MIN_YEAR} and {MAX_YEAR}")]
    OutOfRange,
    #[error("Academic year must end 1 to {MAX_SPAN} years after it starts")]
    InvalidSpan,
}

/// A validated `"YYYY-YYYY"` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcademicYearSpan {
    pub start: i32,
    pub end: i32,
}

impl AcademicYearSpan {
    pub fn parse(label: &str) -> Result<Self, AcademicYearFormatError> {
        let label = label.trim();
        let (start, end) = label
            .split_once('-')
            .ok_or(AcademicYearFormatError::Malformed)?;

        let parse_part = |part: &str| {
            if part.len() == 4 && part.chars().all(|c| c.is_ascii_digit()) {
                part.parse::<i32>()
                    .map_err(|_| AcademicYearFormatError::Malformed)
            } else {
                Err(AcademicYearFormatError::Malformed)
            }
        };
        let start = parse_part(start)?;
        let end = parse_part(end)?;

        if !(MIN_YEAR..=MAX_YEAR).contains(&start) || !(MIN_YEAR..=MAX_YEAR).contains(&end) {
            return Err(AcademicYearFormatError::OutOfRange);
        }
        if !(1..=MAX_SPAN).contains(&(end - start)) {
            return Err(AcademicYearFormatError::InvalidSpan);
        }

        Ok(Self { start, end })
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAcademicYearDto {
    /// Label in the form "YYYY-YYYY", e.g. "2024-2025"
    #[validate(length(equal = 9))]
    pub academic_year: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAcademicYearDto {
    #[validate(length(equal = 9))]
    pub academic_year: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_year() {
        assert_eq!(starting_year("2024-2025"), Some("2024"));
        assert_eq!(starting_year("2024"), None);
        assert_eq!(starting_year("24-25"), None);
        assert_eq!(starting_year("20a4-2025"), None);
    }

    #[test]
    fn test_span_parse_valid() {
        let span = AcademicYearSpan::parse("2024-2025").unwrap();
        assert_eq!(span, AcademicYearSpan { start: 2024, end: 2025 });
        assert_eq!(span.label(), "2024-2025");
        assert!(AcademicYearSpan::parse("2024-2027").is_ok());
    }

    #[test]
    fn test_span_parse_rejects_bad_input() {
        assert_eq!(
            AcademicYearSpan::parse("2024/2025"),
            Err(AcademicYearFormatError::Malformed)
        );
        assert_eq!(
            AcademicYearSpan::parse("1999-2000"),
            Err(AcademicYearFormatError::OutOfRange)
        );
        assert_eq!(
            AcademicYearSpan::parse("2024-2024"),
            Err(AcademicYearFormatError::InvalidSpan)
        );
        assert_eq!(
            AcademicYearSpan::parse("2024-2028"),
            Err(AcademicYearFormatError::InvalidSpan)
        );
        assert_eq!(
            AcademicYearSpan::parse("2025-2024"),
            Err(AcademicYearFormatError::InvalidSpan)
        );
    }

    #[test]
    fn test_create_dto_validation() {
        let dto = CreateAcademicYearDto {
            academic_year: "2024-2025".to_string(),
        };
        assert!(dto.validate().is_ok());

        let short = CreateAcademicYearDto {
            academic_year: "2024-25".to_string(),
        };
        assert!(short.validate().is_err());
    }
}
