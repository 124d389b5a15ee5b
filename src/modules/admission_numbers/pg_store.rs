use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use admitrack_models::admission_numbers::{CourseNumbering, RegenerationCandidate, Renumbering};
use admitrack_models::ids::{AcademicYearId, CourseId, StudentId};
use admitrack_models::students::{NewStudentRecord, SerialSource, Student};

use super::store::{AdmissionStore, StoreError};

pub(crate) const STUDENT_COLUMNS: &str = "id, course_id, academic_year_id, admission_no, serial_no, serial_source, \
     surname, student_name, father_name, date_of_admission, created_at, updated_at";

/// PostgreSQL-backed [`AdmissionStore`].
#[derive(Debug, Clone)]
pub struct PgAdmissionStore {
    db: PgPool,
}

impl PgAdmissionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl AdmissionStore for PgAdmissionStore {
    async fn find_course(
        &self,
        course_id: CourseId,
    ) -> Result<Option<CourseNumbering>, StoreError> {
        let course = sqlx::query_as::<_, CourseNumbering>(
            "SELECT id, course_code, is_special_format, course_type FROM courses WHERE id = $1",
        )
        .bind(course_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(course)
    }

    async fn find_course_by_code(
        &self,
        code: &str,
    ) -> Result<Option<CourseNumbering>, StoreError> {
        let course = sqlx::query_as::<_, CourseNumbering>(
            "SELECT id, course_code, is_special_format, course_type FROM courses WHERE course_code = $1",
        )
        .bind(code)
        .fetch_optional(&self.db)
        .await?;

        Ok(course)
    }

    async fn find_academic_year(
        &self,
        academic_year_id: AcademicYearId,
    ) -> Result<Option<String>, StoreError> {
        let label =
            sqlx::query_scalar::<_, String>("SELECT academic_year FROM academic_years WHERE id = $1")
                .bind(academic_year_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(label)
    }

    async fn max_auto_serial(
        &self,
        course_id: CourseId,
        academic_year_id: AcademicYearId,
    ) -> Result<Option<i32>, StoreError> {
        let max = sqlx::query_scalar::<_, Option<i32>>(
            r#"SELECT MAX(serial_no) FROM students
               WHERE course_id = $1 AND academic_year_id = $2 AND serial_source = 'auto'"#,
        )
        .bind(course_id)
        .bind(academic_year_id)
        .fetch_one(&self.db)
        .await?;

        Ok(max)
    }

    async fn student_exists_with_admission_no(
        &self,
        admission_no: &str,
        exclude_student_id: Option<StudentId>,
    ) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM students
                   WHERE admission_no = $1 AND ($2::uuid IS NULL OR id <> $2)
               )"#,
        )
        .bind(admission_no)
        .bind(exclude_student_id)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    async fn list_students_for_regeneration(
        &self,
        academic_year_id: AcademicYearId,
        course_id: Option<CourseId>,
    ) -> Result<Vec<RegenerationCandidate>, StoreError> {
        let students = sqlx::query_as::<_, RegenerationCandidate>(
            r#"SELECT s.id, s.course_id, c.course_code, c.is_special_format,
                      s.surname, s.student_name, s.admission_no, s.serial_no
               FROM students s
               JOIN courses c ON c.id = s.course_id
               WHERE s.academic_year_id = $1
                 AND s.serial_source = 'auto'
                 AND ($2::uuid IS NULL OR s.course_id = $2)
               ORDER BY s.course_id, s.surname COLLATE "C", s.student_name COLLATE "C", s.id"#,
        )
        .bind(academic_year_id)
        .bind(course_id)
        .fetch_all(&self.db)
        .await?;

        Ok(students)
    }

    async fn update_student_admission_no(
        &self,
        student_id: StudentId,
        admission_no: &str,
        serial_no: i32,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"UPDATE students
               SET admission_no = $1, serial_no = $2, updated_at = NOW()
               WHERE id = $3"#,
        )
        .bind(admission_no)
        .bind(serial_no)
        .bind(student_id)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return StoreError::DuplicateAdmissionNo(admission_no.to_string());
            }
            StoreError::from(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::StudentNotFound(student_id));
        }

        Ok(())
    }

    #[instrument(skip(self, plan), fields(planned = plan.len()))]
    async fn apply_renumbering(
        &self,
        academic_year_id: AcademicYearId,
        plan: &[Renumbering],
    ) -> Result<u64, StoreError> {
        let mut tx = self.db.begin().await?;

        // Holds off admissions to the year from other processes until commit.
        sqlx::query("SELECT 1 FROM admission_sequences WHERE academic_year_id = $1 FOR UPDATE")
            .bind(academic_year_id)
            .execute(&mut *tx)
            .await?;

        // Swaps between rows are legal as long as the final state is unique.
        sqlx::query("SET CONSTRAINTS students_admission_no_key DEFERRED")
            .execute(&mut *tx)
            .await?;

        let mut updated = 0;
        for renumbering in plan {
            let result = sqlx::query(
                r#"UPDATE students
                   SET admission_no = $1, serial_no = $2, updated_at = NOW()
                   WHERE id = $3"#,
            )
            .bind(&renumbering.admission_no)
            .bind(renumbering.serial_no)
            .bind(renumbering.student_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::StudentNotFound(renumbering.student_id));
            }
            updated += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            if is_unique_violation(&e) {
                return StoreError::DuplicateInBatch;
            }
            StoreError::from(e)
        })?;

        Ok(updated)
    }

    #[instrument(skip(self, record), fields(admission_no = %record.admission_no))]
    async fn insert_student(&self, record: NewStudentRecord) -> Result<Student, StoreError> {
        let mut tx = self.db.begin().await?;

        if record.serial_source == SerialSource::Auto {
            sqlx::query(
                r#"INSERT INTO admission_sequences (course_id, academic_year_id)
                   VALUES ($1, $2)
                   ON CONFLICT (course_id, academic_year_id) DO NOTHING"#,
            )
            .bind(record.course_id)
            .bind(record.academic_year_id)
            .execute(&mut *tx)
            .await?;

            // Serialises automatic allocation for the pair across processes.
            sqlx::query(
                r#"SELECT 1 FROM admission_sequences
                   WHERE course_id = $1 AND academic_year_id = $2
                   FOR UPDATE"#,
            )
            .bind(record.course_id)
            .bind(record.academic_year_id)
            .execute(&mut *tx)
            .await?;

            let current_max = sqlx::query_scalar::<_, Option<i32>>(
                r#"SELECT MAX(serial_no) FROM students
                   WHERE course_id = $1 AND academic_year_id = $2 AND serial_source = 'auto'"#,
            )
            .bind(record.course_id)
            .bind(record.academic_year_id)
            .fetch_one(&mut *tx)
            .await?;

            if record.serial_no <= current_max.unwrap_or(0) {
                return Err(StoreError::StaleSerial {
                    serial: record.serial_no,
                });
            }
        }

        let insert_sql = format!(
            r#"INSERT INTO students
                   (course_id, academic_year_id, admission_no, serial_no, serial_source,
                    surname, student_name, father_name, date_of_admission)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {STUDENT_COLUMNS}"#
        );
        let student = sqlx::query_as::<_, Student>(&insert_sql)
            .bind(record.course_id)
            .bind(record.academic_year_id)
            .bind(&record.admission_no)
            .bind(record.serial_no)
            .bind(record.serial_source)
            .bind(&record.surname)
            .bind(&record.student_name)
            .bind(&record.father_name)
            .bind(record.date_of_admission)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return StoreError::DuplicateAdmissionNo(record.admission_no.clone());
                }
                StoreError::from(e)
            })?;

        tx.commit().await?;

        Ok(student)
    }
}
