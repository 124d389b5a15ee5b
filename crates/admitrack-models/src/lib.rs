//! # Admitrack Models
//!
//! Domain models and DTOs for the Admitrack API.
//!
//! # Modules
//!
//! - [`academic_years`]: Academic year models and label validation
//! - [`admission_numbers`]: Admission-number layouts, formatting and allocator DTOs
//! - [`courses`]: Course models and course-code rules
//! - [`ids`]: Strongly-typed entity IDs
//! - [`students`]: Student models
//!
//! # Example
//!
//! ```ignore
//! use admitrack_models::admission_numbers::{CourseFormat, format_admission_number};
//!
//! let number = format_admission_number("2024", "cs", CourseFormat::Standard, 1);
//! assert_eq!(number, "2024CS001");
//! ```

pub mod academic_years;
pub mod admission_numbers;
pub mod courses;
pub mod ids;
pub mod students;

pub use academic_years::{
    AcademicYear, AcademicYearFormatError, AcademicYearSpan, AcademicYearWithStats,
    CreateAcademicYearDto, UpdateAcademicYearDto, starting_year,
};

pub use admission_numbers::{
    AdmissionNumberExists, AdmissionNumberExistsQuery, AdmissionNumberParts,
    AdmissionNumberQuery, AdmissionNumberValidity, AdmissionRequest, CourseFormat, CourseNumbering,
    GeneratedAdmissionNumber, NextAdmissionNumberResponse, RegenerateAdmissionNumbersDto,
    RegenerationCandidate, RegenerationSummary, Renumbering,
};

pub use courses::{
    Course, CourseCodeError, CourseFilterParams, CourseWithStats, CreateCourseDto,
    UpdateCourseDto, normalize_course_code,
};

pub use ids::{AcademicYearId, CourseId, StudentId};

pub use students::{
    CreateStudentDto, NewStudentRecord, PaginatedStudentsResponse, SerialSource, Student,
    StudentFilterParams, StudentWithRelations, UpdateStudentDto,
};
