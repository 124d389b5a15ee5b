use async_trait::async_trait;
use thiserror::Error;

use admitrack_models::admission_numbers::{CourseNumbering, RegenerationCandidate, Renumbering};
use admitrack_models::ids::{AcademicYearId, CourseId, StudentId};
use admitrack_models::students::{NewStudentRecord, Student};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Admission number {0} is already assigned to another student")]
    DuplicateAdmissionNo(String),

    /// An automatic serial was computed from a maximum that has since moved.
    #[error("Serial {serial} has already been allocated for this course and academic year")]
    StaleSerial { serial: i32 },

    #[error("Renumbering would assign an admission number held by another student")]
    DuplicateInBatch,

    #[error("Student {0} not found")]
    StudentNotFound(StudentId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence the admission-number allocator depends on.
#[async_trait]
pub trait AdmissionStore: Send + Sync {
    async fn find_course(&self, course_id: CourseId)
    -> Result<Option<CourseNumbering>, StoreError>;

    /// Looks a course up by its (uppercase) code.
    async fn find_course_by_code(&self, code: &str)
    -> Result<Option<CourseNumbering>, StoreError>;

    /// Returns the academic year label, e.g. "2024-2025".
    async fn find_academic_year(
        &self,
        academic_year_id: AcademicYearId,
    ) -> Result<Option<String>, StoreError>;

    /// Highest serial among automatically numbered students of the pair.
    async fn max_auto_serial(
        &self,
        course_id: CourseId,
        academic_year_id: AcademicYearId,
    ) -> Result<Option<i32>, StoreError>;

    async fn student_exists_with_admission_no(
        &self,
        admission_no: &str,
        exclude_student_id: Option<StudentId>,
    ) -> Result<bool, StoreError>;

    /// Automatically numbered students of a year, ordered by course, surname,
    /// student name, then id. Names compare byte-wise, independent of the
    /// database collation.
    async fn list_students_for_regeneration(
        &self,
        academic_year_id: AcademicYearId,
        course_id: Option<CourseId>,
    ) -> Result<Vec<RegenerationCandidate>, StoreError>;

    /// Rewrites one student's number, committed on its own.
    async fn update_student_admission_no(
        &self,
        student_id: StudentId,
        admission_no: &str,
        serial_no: i32,
    ) -> Result<(), StoreError>;

    /// Applies a whole renumbering plan all-or-nothing. Returns the number of
    /// students updated.
    async fn apply_renumbering(
        &self,
        academic_year_id: AcademicYearId,
        plan: &[Renumbering],
    ) -> Result<u64, StoreError>;

    /// Inserts a numbered student. Automatic serials are re-checked against
    /// the current maximum under the store's own lock.
    async fn insert_student(&self, record: NewStudentRecord) -> Result<Student, StoreError>;
}
