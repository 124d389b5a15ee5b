use sqlx::PgPool;
use tracing::{info, instrument};

use admitrack_core::AppError;
use admitrack_models::admission_numbers::CourseFormat;
use admitrack_models::ids::CourseId;

use crate::modules::courses::model::{
    Course, CourseFilterParams, CourseWithStats, CreateCourseDto, UpdateCourseDto,
    normalize_course_code,
};

const COURSE_COLUMNS: &str = "id, course_name, course_full_name, course_code, is_special_format, \
     course_type, year, created_at, updated_at";

fn map_write_error(e: sqlx::Error, course_code: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::conflict(anyhow::anyhow!(
                "A course with code {} already exists",
                course_code
            ));
        }
        if db_err.is_check_violation() {
            return AppError::unprocessable(anyhow::anyhow!(
                "Course code {} does not match its numbering format",
                course_code
            ));
        }
    }
    AppError::database(e)
}

pub struct CourseService;

impl CourseService {
    /// Create a course. The code is uppercased and must match the length its
    /// format requires.
    #[instrument(skip(db))]
    pub async fn create_course(db: &PgPool, dto: CreateCourseDto) -> Result<Course, AppError> {
        let format = CourseFormat::from_special_flag(dto.is_special_format);
        let course_code = normalize_course_code(&dto.course_code, format)
            .map_err(AppError::unprocessable)?;

        let sql = format!(
            r#"INSERT INTO courses (course_name, course_full_name, course_code, is_special_format, course_type, year)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {COURSE_COLUMNS}"#
        );
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(dto.course_name.trim())
            .bind(&dto.course_full_name)
            .bind(&course_code)
            .bind(dto.is_special_format)
            .bind(dto.course_type.trim())
            .bind(dto.year)
            .fetch_one(db)
            .await
            .map_err(|e| map_write_error(e, &course_code))?;

        info!(course_id = %course.id, course_code = %course.course_code, "Course created");
        Ok(course)
    }

    /// All courses with their enrolment counts, ordered by code.
    #[instrument(skip(db))]
    pub async fn get_courses(
        db: &PgPool,
        filters: CourseFilterParams,
    ) -> Result<Vec<CourseWithStats>, AppError> {
        let mut sql = String::from(
            r#"SELECT c.id, c.course_name, c.course_full_name, c.course_code, c.is_special_format,
                      c.course_type, c.year, COUNT(s.id) AS student_count, c.created_at, c.updated_at
               FROM courses c
               LEFT JOIN students s ON s.course_id = c.id"#,
        );

        let search = filters
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));
        if search.is_some() {
            sql.push_str(" WHERE c.course_name ILIKE $1 OR c.course_code ILIKE $1");
        }
        sql.push_str(" GROUP BY c.id ORDER BY c.course_code");

        let mut query = sqlx::query_as::<_, CourseWithStats>(&sql);
        if let Some(pattern) = &search {
            query = query.bind(pattern);
        }

        Ok(query.fetch_all(db).await?)
    }

    #[instrument(skip(db))]
    pub async fn get_course_by_id(
        db: &PgPool,
        course_id: CourseId,
    ) -> Result<CourseWithStats, AppError> {
        sqlx::query_as::<_, CourseWithStats>(
            r#"SELECT c.id, c.course_name, c.course_full_name, c.course_code, c.is_special_format,
                      c.course_type, c.year, COUNT(s.id) AS student_count, c.created_at, c.updated_at
               FROM courses c
               LEFT JOIN students s ON s.course_id = c.id
               WHERE c.id = $1
               GROUP BY c.id"#,
        )
        .bind(course_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))
    }

    /// Update a course. The code and format cannot change while students are
    /// enrolled, since their admission numbers embed both.
    #[instrument(skip(db))]
    pub async fn update_course(
        db: &PgPool,
        course_id: CourseId,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        let existing = Self::get_course_by_id(db, course_id).await?;

        let is_special_format = dto.is_special_format.unwrap_or(existing.is_special_format);
        let format = CourseFormat::from_special_flag(is_special_format);
        let course_code = normalize_course_code(
            dto.course_code.as_deref().unwrap_or(&existing.course_code),
            format,
        )
        .map_err(AppError::unprocessable)?;

        let numbering_changed = course_code != existing.course_code
            || is_special_format != existing.is_special_format;
        if numbering_changed && existing.student_count > 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Cannot change the code or format of course {}: {} student(s) hold admission numbers for it",
                existing.course_code,
                existing.student_count
            )));
        }

        let course_name = dto
            .course_name
            .map(|n| n.trim().to_string())
            .unwrap_or(existing.course_name);
        let course_full_name = if dto.course_full_name.is_some() {
            dto.course_full_name
        } else {
            existing.course_full_name
        };
        let course_type = dto
            .course_type
            .map(|t| t.trim().to_string())
            .unwrap_or(existing.course_type);
        let year = dto.year.unwrap_or(existing.year);

        let sql = format!(
            r#"UPDATE courses
               SET course_name = $1, course_full_name = $2, course_code = $3, is_special_format = $4,
                   course_type = $5, year = $6, updated_at = NOW()
               WHERE id = $7
               RETURNING {COURSE_COLUMNS}"#
        );
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(&course_name)
            .bind(&course_full_name)
            .bind(&course_code)
            .bind(is_special_format)
            .bind(&course_type)
            .bind(year)
            .bind(course_id)
            .fetch_one(db)
            .await
            .map_err(|e| map_write_error(e, &course_code))?;

        Ok(course)
    }

    /// Delete a course with no enrolled students.
    #[instrument(skip(db))]
    pub async fn delete_course(db: &PgPool, course_id: CourseId) -> Result<(), AppError> {
        let course = Self::get_course_by_id(db, course_id).await?;
        if course.student_count > 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Cannot delete course {}: {} student(s) are enrolled",
                course.course_code,
                course.student_count
            )));
        }

        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_id)
            .execute(db)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_foreign_key_violation()
                {
                    return AppError::conflict(anyhow::anyhow!(
                        "Cannot delete course {}: students are enrolled",
                        course.course_code
                    ));
                }
                AppError::database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Course not found")));
        }

        info!(course_id = %course_id, "Course deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn create_dto(code: &str, special: bool) -> CreateCourseDto {
        CreateCourseDto {
            course_name: format!("Course {}", code),
            course_full_name: None,
            course_code: code.to_string(),
            is_special_format: special,
            course_type: "UG".to_string(),
            year: 3,
        }
    }

    async fn create_academic_year(pool: &PgPool, label: &str) -> uuid::Uuid {
        sqlx::query_scalar::<_, uuid::Uuid>(
            "INSERT INTO academic_years (academic_year) VALUES ($1) RETURNING id",
        )
        .bind(label)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn enroll(pool: &PgPool, course_id: CourseId, academic_year_id: uuid::Uuid, no: &str) {
        sqlx::query(
            r#"INSERT INTO students (course_id, academic_year_id, admission_no, serial_no, surname, student_name)
               VALUES ($1, $2, $3, 1, 'Adams', 'Grace')"#,
        )
        .bind(course_id)
        .bind(academic_year_id)
        .bind(no)
        .execute(pool)
        .await
        .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_course_uppercases_code(pool: PgPool) {
        let course = CourseService::create_course(&pool, create_dto("cs", false))
            .await
            .unwrap();

        assert_eq!(course.course_code, "CS");
        assert!(!course.is_special_format);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_course_rejects_code_of_wrong_length(pool: PgPool) {
        let err = CourseService::create_course(&pool, create_dto("CSE", false))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let err = CourseService::create_course(&pool, create_dto("CS", true))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_course_duplicate_code_conflicts(pool: PgPool) {
        CourseService::create_course(&pool, create_dto("CS", false))
            .await
            .unwrap();

        let err = CourseService::create_course(&pool, create_dto("cs", false))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_get_courses_search(pool: PgPool) {
        CourseService::create_course(&pool, create_dto("CS", false))
            .await
            .unwrap();
        CourseService::create_course(&pool, create_dto("MBA", true))
            .await
            .unwrap();

        let all = CourseService::get_courses(&pool, CourseFilterParams { search: None })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].course_code, "CS");

        let found = CourseService::get_courses(
            &pool,
            CourseFilterParams {
                search: Some("mb".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].course_code, "MBA");
        assert_eq!(found[0].student_count, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_course_code_frozen_once_students_enrolled(pool: PgPool) {
        let course = CourseService::create_course(&pool, create_dto("CS", false))
            .await
            .unwrap();
        let year_id = create_academic_year(&pool, "2024-2025").await;
        enroll(&pool, course.id, year_id, "2024CS001").await;

        let rename = UpdateCourseDto {
            course_name: Some("Computing".to_string()),
            course_full_name: None,
            course_code: None,
            is_special_format: None,
            course_type: None,
            year: None,
        };
        let updated = CourseService::update_course(&pool, course.id, rename)
            .await
            .unwrap();
        assert_eq!(updated.course_name, "Computing");

        let recode = UpdateCourseDto {
            course_name: None,
            course_full_name: None,
            course_code: Some("CO".to_string()),
            is_special_format: None,
            course_type: None,
            year: None,
        };
        let err = CourseService::update_course(&pool, course.id, recode)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_course_refused_while_students_enrolled(pool: PgPool) {
        let course = CourseService::create_course(&pool, create_dto("CS", false))
            .await
            .unwrap();
        let year_id = create_academic_year(&pool, "2024-2025").await;
        enroll(&pool, course.id, year_id, "2024CS001").await;

        let err = CourseService::delete_course(&pool, course.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let empty = CourseService::create_course(&pool, create_dto("ME", false))
            .await
            .unwrap();
        CourseService::delete_course(&pool, empty.id).await.unwrap();

        let err = CourseService::get_course_by_id(&pool, empty.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
