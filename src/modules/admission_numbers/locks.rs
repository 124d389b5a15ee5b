//! In-process locks serialising admission-number allocation.
//!
//! Two levels:
//!
//! - one async mutex per `(course, academic year)`, held across the
//!   read-compute-insert sequence of an admission
//! - one read/write lock per academic year: admissions take it shared,
//!   bulk renumbering takes it exclusively
//!
//! Lock order is always year first, then course/year. Entries are created on
//! first use and dropped when their course or academic year is deleted.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use admitrack_models::ids::{AcademicYearId, CourseId};

pub type SequenceKey = (CourseId, AcademicYearId);

#[derive(Debug, Default)]
pub struct AllocationLocks {
    sequences: DashMap<SequenceKey, Arc<Mutex<()>>>,
    years: DashMap<AcademicYearId, Arc<RwLock<()>>>,
}

/// Held for the duration of one admission.
#[derive(Debug)]
pub struct AdmissionGuard {
    _sequence: OwnedMutexGuard<()>,
    _year: OwnedRwLockReadGuard<()>,
}

impl AllocationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn sequence_lock(&self, key: SequenceKey) -> Arc<Mutex<()>> {
        self.sequences
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn year_lock(&self, academic_year_id: AcademicYearId) -> Arc<RwLock<()>> {
        self.years
            .entry(academic_year_id)
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    pub async fn lock_admission(
        &self,
        course_id: CourseId,
        academic_year_id: AcademicYearId,
    ) -> AdmissionGuard {
        let year = self.year_lock(academic_year_id).read_owned().await;
        let sequence = self
            .sequence_lock((course_id, academic_year_id))
            .lock_owned()
            .await;
        AdmissionGuard {
            _sequence: sequence,
            _year: year,
        }
    }

    pub async fn lock_year_exclusive(
        &self,
        academic_year_id: AcademicYearId,
    ) -> OwnedRwLockWriteGuard<()> {
        self.year_lock(academic_year_id).write_owned().await
    }

    /// Drops the locks of a deleted course. Guards already handed out stay
    /// valid.
    pub fn forget_course(&self, course_id: CourseId) {
        self.sequences.retain(|(course, _), _| *course != course_id);
    }

    /// Drops the locks of a deleted academic year.
    pub fn forget_academic_year(&self, academic_year_id: AcademicYearId) {
        self.sequences.retain(|(_, year), _| *year != academic_year_id);
        self.years.remove(&academic_year_id);
    }

    pub fn tracked_sequences(&self) -> usize {
        self.sequences.len()
    }

    pub fn tracked_years(&self) -> usize {
        self.years.len()
    }
}
