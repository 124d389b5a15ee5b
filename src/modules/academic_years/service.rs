use sqlx::PgPool;
use tracing::{info, instrument};

use admitrack_core::AppError;
use admitrack_models::ids::AcademicYearId;

use crate::modules::academic_years::model::{
    AcademicYear, AcademicYearSpan, AcademicYearWithStats, CreateAcademicYearDto,
    UpdateAcademicYearDto,
};

const SELECT_WITH_STATS: &str = r#"SELECT ay.id, ay.academic_year, COUNT(s.id) AS student_count, ay.created_at, ay.updated_at
     FROM academic_years ay
     LEFT JOIN students s ON s.academic_year_id = ay.id"#;

fn parse_label(label: &str) -> Result<String, AppError> {
    AcademicYearSpan::parse(label)
        .map(|span| span.label())
        .map_err(AppError::unprocessable)
}

fn map_write_error(e: sqlx::Error, label: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::conflict(anyhow::anyhow!(
            "Academic year {} already exists",
            label
        ));
    }
    AppError::database(e)
}

pub struct AcademicYearService;

impl AcademicYearService {
    #[instrument(skip(db))]
    pub async fn create_academic_year(
        db: &PgPool,
        dto: CreateAcademicYearDto,
    ) -> Result<AcademicYear, AppError> {
        let label = parse_label(&dto.academic_year)?;

        let academic_year = sqlx::query_as::<_, AcademicYear>(
            r#"INSERT INTO academic_years (academic_year)
               VALUES ($1)
               RETURNING id, academic_year, created_at, updated_at"#,
        )
        .bind(&label)
        .fetch_one(db)
        .await
        .map_err(|e| map_write_error(e, &label))?;

        info!(academic_year_id = %academic_year.id, academic_year = %label, "Academic year created");
        Ok(academic_year)
    }

    /// All academic years, newest first.
    #[instrument(skip(db))]
    pub async fn get_academic_years(db: &PgPool) -> Result<Vec<AcademicYearWithStats>, AppError> {
        let sql = format!("{SELECT_WITH_STATS} GROUP BY ay.id ORDER BY ay.academic_year DESC");
        let years = sqlx::query_as::<_, AcademicYearWithStats>(&sql)
            .fetch_all(db)
            .await?;
        Ok(years)
    }

    #[instrument(skip(db))]
    pub async fn get_academic_year_by_id(
        db: &PgPool,
        academic_year_id: AcademicYearId,
    ) -> Result<AcademicYearWithStats, AppError> {
        let sql = format!("{SELECT_WITH_STATS} WHERE ay.id = $1 GROUP BY ay.id");
        sqlx::query_as::<_, AcademicYearWithStats>(&sql)
            .bind(academic_year_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Academic year not found")))
    }

    /// Relabel an academic year. The starting year is frozen while students
    /// are enrolled, since their admission numbers begin with it.
    #[instrument(skip(db))]
    pub async fn update_academic_year(
        db: &PgPool,
        academic_year_id: AcademicYearId,
        dto: UpdateAcademicYearDto,
    ) -> Result<AcademicYear, AppError> {
        let existing = Self::get_academic_year_by_id(db, academic_year_id).await?;
        let label = parse_label(&dto.academic_year)?;

        let existing_start = existing.academic_year.split('-').next();
        let new_start = label.split('-').next();
        if existing.student_count > 0 && existing_start != new_start {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Cannot change the starting year of {}: {} student(s) hold admission numbers for it",
                existing.academic_year,
                existing.student_count
            )));
        }

        let academic_year = sqlx::query_as::<_, AcademicYear>(
            r#"UPDATE academic_years
               SET academic_year = $1, updated_at = NOW()
               WHERE id = $2
               RETURNING id, academic_year, created_at, updated_at"#,
        )
        .bind(&label)
        .bind(academic_year_id)
        .fetch_one(db)
        .await
        .map_err(|e| map_write_error(e, &label))?;

        Ok(academic_year)
    }

    /// Delete an academic year with no enrolled students.
    #[instrument(skip(db))]
    pub async fn delete_academic_year(
        db: &PgPool,
        academic_year_id: AcademicYearId,
    ) -> Result<(), AppError> {
        let existing = Self::get_academic_year_by_id(db, academic_year_id).await?;
        if existing.student_count > 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Cannot delete academic year {}: {} student(s) are enrolled",
                existing.academic_year,
                existing.student_count
            )));
        }

        let result = sqlx::query("DELETE FROM academic_years WHERE id = $1")
            .bind(academic_year_id)
            .execute(db)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_foreign_key_violation()
                {
                    return AppError::conflict(anyhow::anyhow!(
                        "Cannot delete academic year {}: students are enrolled",
                        existing.academic_year
                    ));
                }
                AppError::database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Academic year not found"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn create_dto(label: &str) -> CreateAcademicYearDto {
        CreateAcademicYearDto {
            academic_year: label.to_string(),
        }
    }

    async fn enroll(pool: &PgPool, academic_year_id: AcademicYearId) {
        let course_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"INSERT INTO courses (course_name, course_code, course_type, year)
               VALUES ('Computer Science', 'CS', 'UG', 3) RETURNING id"#,
        )
        .fetch_one(pool)
        .await
        .unwrap();

        sqlx::query(
            r#"INSERT INTO students (course_id, academic_year_id, admission_no, serial_no, surname, student_name)
               VALUES ($1, $2, '2024CS001', 1, 'Adams', 'Grace')"#,
        )
        .bind(course_id)
        .bind(academic_year_id)
        .execute(pool)
        .await
        .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_academic_year(pool: PgPool) {
        let year = AcademicYearService::create_academic_year(&pool, create_dto("2024-2025"))
            .await
            .unwrap();
        assert_eq!(year.academic_year, "2024-2025");
        assert_eq!(year.starting_year(), Some("2024"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_academic_year_rejects_bad_labels(pool: PgPool) {
        for label in ["2024/2025", "2025-2024", "1999-2000", "2024-2030"] {
            let err = AcademicYearService::create_academic_year(&pool, create_dto(label))
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY, "{label}");
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_duplicate_academic_year_conflicts(pool: PgPool) {
        AcademicYearService::create_academic_year(&pool, create_dto("2024-2025"))
            .await
            .unwrap();
        let err = AcademicYearService::create_academic_year(&pool, create_dto("2024-2025"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_get_academic_years_newest_first(pool: PgPool) {
        for label in ["2023-2024", "2025-2026", "2024-2025"] {
            AcademicYearService::create_academic_year(&pool, create_dto(label))
                .await
                .unwrap();
        }

        let years = AcademicYearService::get_academic_years(&pool)
            .await
            .unwrap();
        let labels: Vec<_> = years.iter().map(|y| y.academic_year.as_str()).collect();
        assert_eq!(labels, vec!["2025-2026", "2024-2025", "2023-2024"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_keeps_starting_year_once_students_enrolled(pool: PgPool) {
        let year = AcademicYearService::create_academic_year(&pool, create_dto("2024-2025"))
            .await
            .unwrap();
        enroll(&pool, year.id).await;

        let widened = AcademicYearService::update_academic_year(
            &pool,
            year.id,
            UpdateAcademicYearDto {
                academic_year: "2024-2026".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(widened.academic_year, "2024-2026");

        let err = AcademicYearService::update_academic_year(
            &pool,
            year.id,
            UpdateAcademicYearDto {
                academic_year: "2025-2026".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_academic_year(pool: PgPool) {
        let busy = AcademicYearService::create_academic_year(&pool, create_dto("2024-2025"))
            .await
            .unwrap();
        enroll(&pool, busy.id).await;
        let err = AcademicYearService::delete_academic_year(&pool, busy.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let idle = AcademicYearService::create_academic_year(&pool, create_dto("2025-2026"))
            .await
            .unwrap();
        AcademicYearService::delete_academic_year(&pool, idle.id)
            .await
            .unwrap();

        let err = AcademicYearService::delete_academic_year(&pool, idle.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
