use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument};

use admitrack_core::{AppError, PaginationMeta};
use admitrack_models::ids::StudentId;

use crate::modules::admission_numbers::model::AdmissionRequest;
use crate::modules::students::model::{
    CreateStudentDto, PaginatedStudentsResponse, SerialSource, StudentFilterParams,
    StudentWithRelations, UpdateStudentDto,
};
use crate::state::Allocator;

const SELECT_WITH_RELATIONS: &str = r#"SELECT s.id, s.course_id, c.course_code, c.course_name,
            s.academic_year_id, ay.academic_year, s.admission_no, s.serial_no, s.serial_source,
            s.surname, s.student_name, s.father_name, s.date_of_admission, s.created_at, s.updated_at
     FROM students s
     JOIN courses c ON c.id = s.course_id
     JOIN academic_years ay ON ay.id = s.academic_year_id"#;

pub struct StudentService;

impl StudentService {
    /// Admit a student, numbering them through the allocator.
    #[instrument(skip(db, allocator))]
    pub async fn create_student(
        db: &PgPool,
        allocator: &Allocator,
        dto: CreateStudentDto,
    ) -> Result<StudentWithRelations, AppError> {
        let request = AdmissionRequest {
            course_id: dto.course_id,
            academic_year_id: dto.academic_year_id,
            surname: dto.surname.trim().to_string(),
            student_name: dto.student_name.trim().to_string(),
            father_name: dto.father_name.map(|n| n.trim().to_string()),
            date_of_admission: dto
                .date_of_admission
                .unwrap_or_else(|| Utc::now().date_naive()),
            manual_admission_no: dto.admission_no,
        };

        let student = allocator
            .admit(request)
            .await
            .map_err(|e| e.into_app_error())?;

        Self::get_student_by_id(db, student.id).await
    }

    /// Paginated students, newest admission numbers first.
    #[instrument(skip(db))]
    pub async fn get_students(
        db: &PgPool,
        filters: StudentFilterParams,
    ) -> Result<PaginatedStudentsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let search = filters
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let mut conditions = Vec::new();
        if search.is_some() {
            conditions.push(format!(
                "(s.surname ILIKE ${n} OR s.student_name ILIKE ${n} OR s.admission_no ILIKE ${n})",
                n = conditions.len() + 1
            ));
        }
        if filters.course_id.is_some() {
            conditions.push(format!("s.course_id = ${}", conditions.len() + 1));
        }
        if filters.academic_year_id.is_some() {
            conditions.push(format!("s.academic_year_id = ${}", conditions.len() + 1));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM students s{where_clause}");
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(pattern) = &search {
            count_sql = count_sql.bind(pattern);
        }
        if let Some(course_id) = filters.course_id {
            count_sql = count_sql.bind(course_id);
        }
        if let Some(academic_year_id) = filters.academic_year_id {
            count_sql = count_sql.bind(academic_year_id);
        }
        let total = count_sql
            .fetch_one(db)
            .await
            .context("Failed to count students")?;

        let data_query = format!(
            "{SELECT_WITH_RELATIONS}{where_clause} ORDER BY s.admission_no DESC LIMIT {limit} OFFSET {offset}"
        );
        let mut data_sql = sqlx::query_as::<_, StudentWithRelations>(&data_query);
        if let Some(pattern) = &search {
            data_sql = data_sql.bind(pattern);
        }
        if let Some(course_id) = filters.course_id {
            data_sql = data_sql.bind(course_id);
        }
        if let Some(academic_year_id) = filters.academic_year_id {
            data_sql = data_sql.bind(academic_year_id);
        }
        let data = data_sql
            .fetch_all(db)
            .await
            .context("Failed to fetch students")?;

        Ok(PaginatedStudentsResponse {
            data,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_student_by_id(
        db: &PgPool,
        student_id: StudentId,
    ) -> Result<StudentWithRelations, AppError> {
        let query = format!("{SELECT_WITH_RELATIONS} WHERE s.id = $1");
        sqlx::query_as::<_, StudentWithRelations>(&query)
            .bind(student_id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch student")?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))
    }

    /// Edit a student's details. Numbers are never regenerated here; a new
    /// `admission_no` is only accepted for manually numbered students and must
    /// belong to their course and academic year.
    #[instrument(skip(db, allocator))]
    pub async fn update_student(
        db: &PgPool,
        allocator: &Allocator,
        student_id: StudentId,
        dto: UpdateStudentDto,
    ) -> Result<StudentWithRelations, AppError> {
        let existing = Self::get_student_by_id(db, student_id).await?;

        let (admission_no, serial_no) = match dto.admission_no.as_deref() {
            Some(number) if number.trim().to_uppercase() != existing.admission_no => {
                if existing.serial_source != SerialSource::Manual {
                    return Err(AppError::unprocessable(anyhow::anyhow!(
                        "Admission number {} was generated automatically and cannot be edited; regenerate the academic year instead",
                        existing.admission_no
                    )));
                }

                let (number, serial) = allocator
                    .resolve_manual_number(number, existing.course_id, existing.academic_year_id)
                    .await
                    .map_err(|e| e.into_app_error())?;

                if allocator
                    .exists(&number, Some(student_id))
                    .await
                    .map_err(|e| e.into_app_error())?
                {
                    return Err(AppError::conflict(anyhow::anyhow!(
                        "Admission number {} already exists",
                        number
                    )));
                }
                (number, serial)
            }
            _ => (existing.admission_no.clone(), existing.serial_no),
        };

        let surname = dto
            .surname
            .map(|s| s.trim().to_string())
            .unwrap_or(existing.surname);
        let student_name = dto
            .student_name
            .map(|s| s.trim().to_string())
            .unwrap_or(existing.student_name);
        let father_name = if dto.father_name.is_some() {
            dto.father_name.map(|s| s.trim().to_string())
        } else {
            existing.father_name
        };
        let date_of_admission = dto.date_of_admission.unwrap_or(existing.date_of_admission);

        sqlx::query(
            r#"UPDATE students
               SET surname = $1, student_name = $2, father_name = $3, date_of_admission = $4,
                   admission_no = $5, serial_no = $6, updated_at = NOW()
               WHERE id = $7"#,
        )
        .bind(&surname)
        .bind(&student_name)
        .bind(&father_name)
        .bind(date_of_admission)
        .bind(&admission_no)
        .bind(serial_no)
        .bind(student_id)
        .execute(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!(
                    "Admission number {} already exists",
                    admission_no
                ));
            }
            AppError::database(e)
        })?;

        Self::get_student_by_id(db, student_id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_student(db: &PgPool, student_id: StudentId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(student_id)
            .execute(db)
            .await
            .context("Failed to delete student")?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }

        info!(student_id = %student_id, "Student deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admitrack_config::AllocatorConfig;
    use admitrack_core::PaginationParams;
    use admitrack_models::ids::{AcademicYearId, CourseId};
    use axum::http::StatusCode;

    use crate::modules::admission_numbers::{AdmissionAllocator, PgAdmissionStore};

    fn allocator(pool: &PgPool) -> Allocator {
        AdmissionAllocator::new(PgAdmissionStore::new(pool.clone()), AllocatorConfig::default())
    }

    async fn seed_course_and_year(pool: &PgPool) -> (CourseId, AcademicYearId) {
        let course_id = sqlx::query_scalar::<_, CourseId>(
            r#"INSERT INTO courses (course_name, course_code, course_type, year)
               VALUES ('Computer Science', 'CS', 'UG', 3) RETURNING id"#,
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let academic_year_id = sqlx::query_scalar::<_, AcademicYearId>(
            "INSERT INTO academic_years (academic_year) VALUES ('2024-2025') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        (course_id, academic_year_id)
    }

    fn create_dto(
        course_id: CourseId,
        academic_year_id: AcademicYearId,
        surname: &str,
        admission_no: Option<&str>,
    ) -> CreateStudentDto {
        CreateStudentDto {
            course_id,
            academic_year_id,
            surname: surname.to_string(),
            student_name: "Test".to_string(),
            father_name: None,
            date_of_admission: None,
            admission_no: admission_no.map(str::to_string),
        }
    }

    fn update_dto() -> UpdateStudentDto {
        UpdateStudentDto {
            surname: None,
            student_name: None,
            father_name: None,
            date_of_admission: None,
            admission_no: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_student_allocates_sequential_numbers(pool: PgPool) {
        let allocator = allocator(&pool);
        let (course_id, year_id) = seed_course_and_year(&pool).await;

        let first = StudentService::create_student(
            &pool,
            &allocator,
            create_dto(course_id, year_id, "Adams", None),
        )
        .await
        .unwrap();
        let second = StudentService::create_student(
            &pool,
            &allocator,
            create_dto(course_id, year_id, "Brown", None),
        )
        .await
        .unwrap();

        assert_eq!(first.admission_no, "2024CS001");
        assert_eq!(second.admission_no, "2024CS002");
        assert_eq!(second.course_code, "CS");
        assert_eq!(second.academic_year, "2024-2025");
        assert_eq!(second.date_of_admission, Utc::now().date_naive());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_get_students_filters_and_orders(pool: PgPool) {
        let allocator = allocator(&pool);
        let (course_id, year_id) = seed_course_and_year(&pool).await;
        for surname in ["Adams", "Brown", "Clark"] {
            StudentService::create_student(
                &pool,
                &allocator,
                create_dto(course_id, year_id, surname, None),
            )
            .await
            .unwrap();
        }

        let all = StudentService::get_students(&pool, StudentFilterParams::default())
            .await
            .unwrap();
        assert_eq!(all.meta.total, 3);
        assert_eq!(all.data[0].admission_no, "2024CS003");

        let found = StudentService::get_students(
            &pool,
            StudentFilterParams {
                search: Some("brow".to_string()),
                course_id: Some(course_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(found.meta.total, 1);
        assert_eq!(found.data[0].surname, "Brown");

        let page = StudentService::get_students(
            &pool,
            StudentFilterParams {
                academic_year_id: Some(year_id),
                pagination: PaginationParams {
                    limit: Some(2),
                    offset: None,
                    page: None,
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.data.len(), 2);
        assert!(page.meta.has_more);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_student_never_renumbers_auto_students(pool: PgPool) {
        let allocator = allocator(&pool);
        let (course_id, year_id) = seed_course_and_year(&pool).await;
        let student = StudentService::create_student(
            &pool,
            &allocator,
            create_dto(course_id, year_id, "Adams", None),
        )
        .await
        .unwrap();

        let renamed = StudentService::update_student(
            &pool,
            &allocator,
            student.id,
            UpdateStudentDto {
                surname: Some("Zimmer".to_string()),
                ..update_dto()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.surname, "Zimmer");
        assert_eq!(renamed.admission_no, "2024CS001");

        let err = StudentService::update_student(
            &pool,
            &allocator,
            student.id,
            UpdateStudentDto {
                admission_no: Some("2024CS050".to_string()),
                ..update_dto()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_student_corrects_manual_number(pool: PgPool) {
        let allocator = allocator(&pool);
        let (course_id, year_id) = seed_course_and_year(&pool).await;
        let taken = StudentService::create_student(
            &pool,
            &allocator,
            create_dto(course_id, year_id, "Adams", None),
        )
        .await
        .unwrap();
        let manual = StudentService::create_student(
            &pool,
            &allocator,
            create_dto(course_id, year_id, "Brown", Some("2024cs500")),
        )
        .await
        .unwrap();
        assert_eq!(manual.admission_no, "2024CS500");
        assert_eq!(manual.serial_source, SerialSource::Manual);

        let corrected = StudentService::update_student(
            &pool,
            &allocator,
            manual.id,
            UpdateStudentDto {
                admission_no: Some("2024CS600".to_string()),
                ..update_dto()
            },
        )
        .await
        .unwrap();
        assert_eq!(corrected.admission_no, "2024CS600");
        assert_eq!(corrected.serial_no, 600);

        let err = StudentService::update_student(
            &pool,
            &allocator,
            manual.id,
            UpdateStudentDto {
                admission_no: Some(taken.admission_no.clone()),
                ..update_dto()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_student(pool: PgPool) {
        let allocator = allocator(&pool);
        let (course_id, year_id) = seed_course_and_year(&pool).await;
        let student = StudentService::create_student(
            &pool,
            &allocator,
            create_dto(course_id, year_id, "Adams", None),
        )
        .await
        .unwrap();

        StudentService::delete_student(&pool, student.id)
            .await
            .unwrap();

        let err = StudentService::get_student_by_id(&pool, student.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
