//! Admission-number allocation.
//!
//! [`AdmissionAllocator`] computes, checks and rewrites admission numbers on
//! top of an [`AdmissionStore`]. Numbers look like `2024CS001` (standard
//! course) or `2024CSE01` (special course); see
//! [`admitrack_models::admission_numbers`] for the layout rules.
//!
//! Allocation is `MAX(auto serial) + 1` per course and academic year. The
//! read-compute-insert sequence of [`AdmissionAllocator::admit`] runs under an
//! in-process lock for the pair, and the store re-checks the serial under its
//! own lock, so two admissions can never be handed the same number.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use admitrack_config::{AllocatorConfig, OverflowPolicy, RegenerationMode};
use admitrack_core::AppError;
use admitrack_models::academic_years::starting_year;
use admitrack_models::admission_numbers::{
    AdmissionNumberParts, AdmissionRequest, CourseNumbering, GeneratedAdmissionNumber,
    RegenerationCandidate, RegenerationSummary, Renumbering, format_admission_number,
    layout_candidates,
};
use admitrack_models::ids::{AcademicYearId, CourseId, StudentId};
use admitrack_models::students::{NewStudentRecord, SerialSource, Student};

use super::locks::AllocationLocks;
use super::store::{AdmissionStore, StoreError};
use crate::metrics;

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("{0}")]
    NotFound(String),

    #[error("Course {course_code} is misconfigured: {reason}")]
    Configuration { course_code: String, reason: String },

    #[error(
        "Admission numbers for course {course_code} are exhausted: serial {serial} exceeds the maximum of {max_serial}"
    )]
    CapacityExhausted {
        course_code: String,
        serial: i32,
        max_serial: i32,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid manual admission number: {0}")]
    InvalidManualNumber(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AllocationError {
    pub fn into_app_error(self) -> AppError {
        match self {
            Self::NotFound(_) => AppError::not_found(self),
            Self::Configuration { .. } | Self::Store(_) => AppError::internal(self),
            Self::CapacityExhausted { .. } | Self::InvalidManualNumber(_) => {
                AppError::unprocessable(self)
            }
            Self::Conflict(_) => AppError::conflict(self),
        }
    }

    fn from_insert(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateAdmissionNo(number) => {
                Self::Conflict(format!("Admission number {number} already exists"))
            }
            StoreError::StaleSerial { serial } => Self::Conflict(format!(
                "Serial {serial} was allocated concurrently; generate a new admission number"
            )),
            other => Self::Store(other),
        }
    }
}

pub struct AdmissionAllocator<S> {
    store: S,
    config: AllocatorConfig,
    locks: AllocationLocks,
}

impl<S: AdmissionStore> AdmissionAllocator<S> {
    pub fn new(store: S, config: AllocatorConfig) -> Self {
        Self {
            store,
            config,
            locks: AllocationLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> AllocatorConfig {
        self.config
    }

    /// Releases the in-process locks of a deleted course.
    pub fn forget_course(&self, course_id: CourseId) {
        self.locks.forget_course(course_id);
    }

    /// Releases the in-process locks of a deleted academic year.
    pub fn forget_academic_year(&self, academic_year_id: AcademicYearId) {
        self.locks.forget_academic_year(academic_year_id);
    }

    pub fn tracked_lock_count(&self) -> usize {
        self.locks.tracked_sequences()
    }

    async fn load_course(&self, course_id: CourseId) -> Result<CourseNumbering, AllocationError> {
        self.store
            .find_course(course_id)
            .await?
            .ok_or_else(|| AllocationError::NotFound("Course not found".to_string()))
    }

    /// Resolves an academic year to its four-digit starting year.
    async fn load_starting_year(
        &self,
        academic_year_id: AcademicYearId,
    ) -> Result<String, AllocationError> {
        let label = self
            .store
            .find_academic_year(academic_year_id)
            .await?
            .ok_or_else(|| AllocationError::NotFound("Academic year not found".to_string()))?;

        starting_year(&label).map(str::to_string).ok_or_else(|| {
            AllocationError::NotFound(format!(
                "Academic year '{label}' does not start with a four-digit year"
            ))
        })
    }

    fn check_configuration(course: &CourseNumbering) -> Result<(), AllocationError> {
        if course.has_consistent_code() {
            return Ok(());
        }
        let format = course.format();
        error!(
            course_id = %course.id,
            course_code = %course.course_code,
            is_special_format = course.is_special_format,
            "Course code length does not match its numbering format"
        );
        Err(AllocationError::Configuration {
            course_code: course.course_code.clone(),
            reason: format!(
                "expected a {}-character code for {} numbering",
                format.code_len(),
                if format.is_special() { "special" } else { "standard" }
            ),
        })
    }

    /// Computes the next automatic admission number without reserving it.
    #[instrument(skip(self))]
    pub async fn generate(
        &self,
        course_id: CourseId,
        academic_year_id: AcademicYearId,
    ) -> Result<GeneratedAdmissionNumber, AllocationError> {
        let course = self.load_course(course_id).await?;
        let starting_year = self.load_starting_year(academic_year_id).await?;
        Self::check_configuration(&course)?;

        let format = course.format();
        let serial = self
            .store
            .max_auto_serial(course_id, academic_year_id)
            .await?
            .map_or(1, |max| max + 1);

        if serial > format.max_serial() {
            metrics::track_capacity_overflow(&course.course_code, self.config.overflow_policy);
            match self.config.overflow_policy {
                OverflowPolicy::Reject => {
                    warn!(
                        course_code = %course.course_code,
                        serial,
                        max_serial = format.max_serial(),
                        "Rejecting admission number beyond course capacity"
                    );
                    return Err(AllocationError::CapacityExhausted {
                        course_code: course.course_code,
                        serial,
                        max_serial: format.max_serial(),
                    });
                }
                OverflowPolicy::Warn => {
                    warn!(
                        course_code = %course.course_code,
                        serial,
                        max_serial = format.max_serial(),
                        "Issuing admission number beyond course capacity"
                    );
                }
            }
        }

        Ok(GeneratedAdmissionNumber {
            admission_number: format_admission_number(
                &starting_year,
                &course.course_code,
                format,
                serial,
            ),
            serial_no: serial,
        })
    }

    /// Resolves a number against the known courses. The special layout is
    /// tried before the standard one.
    #[instrument(skip(self))]
    pub async fn parse(
        &self,
        admission_number: &str,
    ) -> Result<Option<AdmissionNumberParts>, AllocationError> {
        for candidate in layout_candidates(admission_number) {
            let Some(course) = self.store.find_course_by_code(&candidate.course_code).await? else {
                continue;
            };
            if course.format() == candidate.format {
                return Ok(Some(candidate.into_parts()));
            }
        }
        Ok(None)
    }

    pub async fn validate(&self, admission_number: &str) -> Result<bool, AllocationError> {
        Ok(self.parse(admission_number).await?.is_some())
    }

    pub async fn exists(
        &self,
        admission_number: &str,
        exclude_student_id: Option<StudentId>,
    ) -> Result<bool, AllocationError> {
        Ok(self
            .store
            .student_exists_with_admission_no(admission_number, exclude_student_id)
            .await?)
    }

    /// The next number for display, or `"Error: ..."`. Never fails.
    pub async fn preview_next(
        &self,
        course_id: CourseId,
        academic_year_id: AcademicYearId,
    ) -> String {
        match self.generate(course_id, academic_year_id).await {
            Ok(generated) => generated.admission_number,
            Err(e) => format!("Error: {e}"),
        }
    }

    /// Checks a manually entered number against the student's course and
    /// year. Returns the normalised number and its serial.
    pub async fn resolve_manual_number(
        &self,
        admission_number: &str,
        course_id: CourseId,
        academic_year_id: AcademicYearId,
    ) -> Result<(String, i32), AllocationError> {
        let course = self.load_course(course_id).await?;
        let starting_year = self.load_starting_year(academic_year_id).await?;
        Self::check_configuration(&course)?;

        let normalized = admission_number.trim().to_uppercase();
        let candidates = layout_candidates(&normalized);
        if candidates.is_empty() {
            return Err(AllocationError::InvalidManualNumber(format!(
                "'{normalized}' is not a well-formed admission number"
            )));
        }

        let candidate = candidates
            .into_iter()
            .find(|c| c.format == course.format() && c.course_code == course.course_code)
            .ok_or_else(|| {
                AllocationError::InvalidManualNumber(format!(
                    "'{normalized}' does not belong to course {}",
                    course.course_code
                ))
            })?;

        if candidate.year.to_string() != starting_year {
            return Err(AllocationError::InvalidManualNumber(format!(
                "'{normalized}' does not belong to academic year starting {starting_year}"
            )));
        }

        Ok((normalized, candidate.serial))
    }

    /// Numbers and inserts a new student.
    #[instrument(skip(self, request), fields(course_id = %request.course_id, academic_year_id = %request.academic_year_id))]
    pub async fn admit(&self, request: AdmissionRequest) -> Result<Student, AllocationError> {
        let _guard = self
            .locks
            .lock_admission(request.course_id, request.academic_year_id)
            .await;

        let (admission_no, serial_no, serial_source) = match &request.manual_admission_no {
            Some(number) => {
                let (number, serial) = self
                    .resolve_manual_number(number, request.course_id, request.academic_year_id)
                    .await?;
                (number, serial, SerialSource::Manual)
            }
            None => {
                let generated = self
                    .generate(request.course_id, request.academic_year_id)
                    .await?;
                (
                    generated.admission_number,
                    generated.serial_no,
                    SerialSource::Auto,
                )
            }
        };

        if self
            .store
            .student_exists_with_admission_no(&admission_no, None)
            .await?
        {
            return Err(AllocationError::Conflict(format!(
                "Admission number {admission_no} already exists"
            )));
        }

        let student = self
            .store
            .insert_student(NewStudentRecord {
                course_id: request.course_id,
                academic_year_id: request.academic_year_id,
                admission_no,
                serial_no,
                serial_source,
                surname: request.surname,
                student_name: request.student_name,
                father_name: request.father_name,
                date_of_admission: request.date_of_admission,
            })
            .await
            .map_err(AllocationError::from_insert)?;

        metrics::track_admission_allocated(serial_source.as_str());
        info!(
            student_id = %student.id,
            admission_no = %student.admission_no,
            serial_source = serial_source.as_str(),
            "Student admitted"
        );

        Ok(student)
    }

    pub async fn regenerate_for_year(
        &self,
        academic_year_id: AcademicYearId,
        course_id: Option<CourseId>,
    ) -> Result<RegenerationSummary, AllocationError> {
        self.regenerate_for_year_with_mode(
            academic_year_id,
            course_id,
            self.config.regeneration_mode,
        )
        .await
    }

    /// Renumbers every automatically numbered student of a year from serial 1
    /// per course, in surname order. Manual numbers are left alone.
    #[instrument(skip(self))]
    pub async fn regenerate_for_year_with_mode(
        &self,
        academic_year_id: AcademicYearId,
        course_id: Option<CourseId>,
        mode: RegenerationMode,
    ) -> Result<RegenerationSummary, AllocationError> {
        let _year_guard = self.locks.lock_year_exclusive(academic_year_id).await;

        let starting_year = self.load_starting_year(academic_year_id).await?;
        if let Some(course_id) = course_id {
            self.load_course(course_id).await?;
        }

        let candidates = self
            .store
            .list_students_for_regeneration(academic_year_id, course_id)
            .await?;
        let plan = plan_renumbering(&starting_year, &candidates);

        let mut summary = RegenerationSummary {
            academic_year_id,
            course_id,
            mode,
            updated: 0,
            unchanged: plan.unchanged,
            skipped: plan.skipped,
            failed: 0,
        };

        match mode {
            RegenerationMode::Atomic => {
                summary.updated = self
                    .store
                    .apply_renumbering(academic_year_id, &plan.renumberings)
                    .await
                    .map_err(|e| match e {
                        StoreError::DuplicateInBatch => AllocationError::Conflict(
                            "Renumbering collides with an existing admission number; no students were changed"
                                .to_string(),
                        ),
                        other => AllocationError::Store(other),
                    })?;
            }
            RegenerationMode::PerRecord => {
                for renumbering in &plan.renumberings {
                    match self
                        .store
                        .update_student_admission_no(
                            renumbering.student_id,
                            &renumbering.admission_no,
                            renumbering.serial_no,
                        )
                        .await
                    {
                        Ok(()) => summary.updated += 1,
                        Err(e) => {
                            error!(
                                student_id = %renumbering.student_id,
                                admission_no = %renumbering.admission_no,
                                error = %e,
                                "Failed to renumber student"
                            );
                            summary.failed += 1;
                        }
                    }
                }
            }
        }

        metrics::track_regeneration(&summary);
        info!(
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            failed = summary.failed,
            mode = %mode,
            "Admission numbers regenerated"
        );

        Ok(summary)
    }
}

#[derive(Debug, Default)]
struct RenumberingPlan {
    renumberings: Vec<Renumbering>,
    unchanged: u64,
    skipped: u64,
}

/// Assigns serials from 1 within each course group. Candidates arrive
/// grouped by course and already in surname order.
///
/// Skipped students keep their current number, so any renumbering that would
/// take a kept number is skipped as well.
fn plan_renumbering(starting_year: &str, candidates: &[RegenerationCandidate]) -> RenumberingPlan {
    let mut plan = RenumberingPlan::default();
    let mut kept: HashSet<&str> = HashSet::new();
    let mut pending: Vec<(Renumbering, &str)> = Vec::new();
    let mut current_course = None;
    let mut serial = 0;

    for candidate in candidates {
        if current_course != Some(candidate.course_id) {
            current_course = Some(candidate.course_id);
            serial = 0;
        }
        serial += 1;

        let course = CourseNumbering {
            id: candidate.course_id,
            course_code: candidate.course_code.clone(),
            is_special_format: candidate.is_special_format,
            course_type: String::new(),
        };
        let format = course.format();

        if !course.has_consistent_code() {
            error!(
                student_id = %candidate.id,
                course_code = %candidate.course_code,
                is_special_format = candidate.is_special_format,
                "Skipping student: course code length does not match its numbering format"
            );
            plan.skipped += 1;
            kept.insert(candidate.admission_no.as_str());
            continue;
        }

        if serial > format.max_serial() {
            error!(
                student_id = %candidate.id,
                course_code = %candidate.course_code,
                serial,
                max_serial = format.max_serial(),
                "Skipping student: serial exceeds course capacity"
            );
            plan.skipped += 1;
            kept.insert(candidate.admission_no.as_str());
            continue;
        }

        let admission_no =
            format_admission_number(starting_year, &candidate.course_code, format, serial);
        if admission_no == candidate.admission_no && serial == candidate.serial_no {
            plan.unchanged += 1;
            continue;
        }

        pending.push((
            Renumbering {
                student_id: candidate.id,
                admission_no,
                serial_no: serial,
            },
            candidate.admission_no.as_str(),
        ));
    }

    // A blocked student keeps its own number in turn, which can block another.
    loop {
        let (blocked, rest): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|(renumbering, _)| kept.contains(renumbering.admission_no.as_str()));
        pending = rest;
        if blocked.is_empty() {
            break;
        }
        for (renumbering, current) in blocked {
            error!(
                student_id = %renumbering.student_id,
                admission_no = %renumbering.admission_no,
                kept_admission_no = %current,
                "Skipping student: recomputed number is held by a skipped student"
            );
            plan.skipped += 1;
            kept.insert(current);
        }
    }

    plan.renumberings = pending
        .into_iter()
        .map(|(renumbering, _)| renumbering)
        .collect();
    plan
}
