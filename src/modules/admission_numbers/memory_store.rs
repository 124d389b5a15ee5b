//! In-memory [`AdmissionStore`] for tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use admitrack_models::admission_numbers::{CourseNumbering, RegenerationCandidate, Renumbering};
use admitrack_models::ids::{AcademicYearId, CourseId, StudentId};
use admitrack_models::students::{NewStudentRecord, SerialSource, Student};

use super::store::{AdmissionStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    courses: HashMap<CourseId, CourseNumbering>,
    academic_years: HashMap<AcademicYearId, String>,
    students: Vec<Student>,
}

#[derive(Debug, Default)]
pub struct InMemoryAdmissionStore {
    tables: Mutex<Tables>,
}

impl InMemoryAdmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a course as stored, without checking its code length.
    pub async fn add_course(&self, course_code: &str, is_special_format: bool) -> CourseId {
        let id = CourseId::new();
        self.tables.lock().await.courses.insert(
            id,
            CourseNumbering {
                id,
                course_code: course_code.to_string(),
                is_special_format,
                course_type: "UG".to_string(),
            },
        );
        id
    }

    pub async fn add_academic_year(&self, label: &str) -> AcademicYearId {
        let id = AcademicYearId::new();
        self.tables
            .lock()
            .await
            .academic_years
            .insert(id, label.to_string());
        id
    }

    /// Inserts a student row as-is, bypassing serial checks.
    pub async fn add_student(
        &self,
        course_id: CourseId,
        academic_year_id: AcademicYearId,
        surname: &str,
        admission_no: &str,
        serial_no: i32,
        serial_source: SerialSource,
    ) -> StudentId {
        let student = build_student(NewStudentRecord {
            course_id,
            academic_year_id,
            admission_no: admission_no.to_string(),
            serial_no,
            serial_source,
            surname: surname.to_string(),
            student_name: "Student".to_string(),
            father_name: None,
            date_of_admission: Utc::now().date_naive(),
        });
        let id = student.id;
        self.tables.lock().await.students.push(student);
        id
    }

    pub async fn student(&self, student_id: StudentId) -> Option<Student> {
        self.tables
            .lock()
            .await
            .students
            .iter()
            .find(|s| s.id == student_id)
            .cloned()
    }

    pub async fn students(&self) -> Vec<Student> {
        self.tables.lock().await.students.clone()
    }
}

fn build_student(record: NewStudentRecord) -> Student {
    let now = Utc::now();
    Student {
        id: StudentId::new(),
        course_id: record.course_id,
        academic_year_id: record.academic_year_id,
        admission_no: record.admission_no,
        serial_no: record.serial_no,
        serial_source: record.serial_source,
        surname: record.surname,
        student_name: record.student_name,
        father_name: record.father_name,
        date_of_admission: record.date_of_admission,
        created_at: now,
        updated_at: now,
    }
}

fn max_auto_serial_in(
    students: &[Student],
    course_id: CourseId,
    academic_year_id: AcademicYearId,
) -> Option<i32> {
    students
        .iter()
        .filter(|s| {
            s.course_id == course_id
                && s.academic_year_id == academic_year_id
                && s.serial_source == SerialSource::Auto
        })
        .map(|s| s.serial_no)
        .max()
}

#[async_trait]
impl AdmissionStore for InMemoryAdmissionStore {
    async fn find_course(
        &self,
        course_id: CourseId,
    ) -> Result<Option<CourseNumbering>, StoreError> {
        Ok(self.tables.lock().await.courses.get(&course_id).cloned())
    }

    async fn find_course_by_code(
        &self,
        code: &str,
    ) -> Result<Option<CourseNumbering>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .courses
            .values()
            .find(|c| c.course_code == code)
            .cloned())
    }

    async fn find_academic_year(
        &self,
        academic_year_id: AcademicYearId,
    ) -> Result<Option<String>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .academic_years
            .get(&academic_year_id)
            .cloned())
    }

    async fn max_auto_serial(
        &self,
        course_id: CourseId,
        academic_year_id: AcademicYearId,
    ) -> Result<Option<i32>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(max_auto_serial_in(
            &tables.students,
            course_id,
            academic_year_id,
        ))
    }

    async fn student_exists_with_admission_no(
        &self,
        admission_no: &str,
        exclude_student_id: Option<StudentId>,
    ) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .students
            .iter()
            .any(|s| s.admission_no == admission_no && Some(s.id) != exclude_student_id))
    }

    async fn list_students_for_regeneration(
        &self,
        academic_year_id: AcademicYearId,
        course_id: Option<CourseId>,
    ) -> Result<Vec<RegenerationCandidate>, StoreError> {
        let tables = self.tables.lock().await;
        let mut candidates: Vec<RegenerationCandidate> = tables
            .students
            .iter()
            .filter(|s| {
                s.academic_year_id == academic_year_id
                    && s.serial_source == SerialSource::Auto
                    && course_id.is_none_or(|c| c == s.course_id)
            })
            .filter_map(|s| {
                let course = tables.courses.get(&s.course_id)?;
                Some(RegenerationCandidate {
                    id: s.id,
                    course_id: s.course_id,
                    course_code: course.course_code.clone(),
                    is_special_format: course.is_special_format,
                    surname: s.surname.clone(),
                    student_name: s.student_name.clone(),
                    admission_no: s.admission_no.clone(),
                    serial_no: s.serial_no,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            (a.course_id, &a.surname, &a.student_name, a.id).cmp(&(
                b.course_id,
                &b.surname,
                &b.student_name,
                b.id,
            ))
        });
        Ok(candidates)
    }

    async fn update_student_admission_no(
        &self,
        student_id: StudentId,
        admission_no: &str,
        serial_no: i32,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables
            .students
            .iter()
            .any(|s| s.admission_no == admission_no && s.id != student_id)
        {
            return Err(StoreError::DuplicateAdmissionNo(admission_no.to_string()));
        }

        let student = tables
            .students
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or(StoreError::StudentNotFound(student_id))?;
        student.admission_no = admission_no.to_string();
        student.serial_no = serial_no;
        student.updated_at = Utc::now();
        Ok(())
    }

    async fn apply_renumbering(
        &self,
        _academic_year_id: AcademicYearId,
        plan: &[Renumbering],
    ) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        let mut staged = tables.students.clone();

        for renumbering in plan {
            let student = staged
                .iter_mut()
                .find(|s| s.id == renumbering.student_id)
                .ok_or(StoreError::StudentNotFound(renumbering.student_id))?;
            student.admission_no = renumbering.admission_no.clone();
            student.serial_no = renumbering.serial_no;
            student.updated_at = Utc::now();
        }

        let mut seen = HashSet::new();
        if !staged.iter().all(|s| seen.insert(s.admission_no.as_str())) {
            return Err(StoreError::DuplicateInBatch);
        }

        tables.students = staged;
        Ok(plan.len() as u64)
    }

    async fn insert_student(&self, record: NewStudentRecord) -> Result<Student, StoreError> {
        let mut tables = self.tables.lock().await;

        if record.serial_source == SerialSource::Auto {
            let current_max =
                max_auto_serial_in(&tables.students, record.course_id, record.academic_year_id);
            if record.serial_no <= current_max.unwrap_or(0) {
                return Err(StoreError::StaleSerial {
                    serial: record.serial_no,
                });
            }
        }

        if tables
            .students
            .iter()
            .any(|s| s.admission_no == record.admission_no)
        {
            return Err(StoreError::DuplicateAdmissionNo(record.admission_no));
        }

        let student = build_student(record);
        tables.students.push(student.clone());
        Ok(student)
    }
}

/// Admission date used by fixtures.
pub fn fixture_admission_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap_or_default()
}
