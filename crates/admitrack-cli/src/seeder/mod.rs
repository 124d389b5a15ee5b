//! Database seeding for development and load testing.
//!
//! Generates a course catalogue, a run of academic years and fake students
//! with valid, gap-free admission numbers.

pub mod academic_years;
pub mod courses;
pub mod models;
pub mod students;

use sqlx::PgPool;
use std::time::Instant;

pub use models::{SeedConfig, SeededAcademicYear, SeededCourse, StudentSeed};

/// Totals reported after a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub courses: usize,
    pub academic_years: usize,
    pub students: u64,
}

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<SeedSummary, sqlx::Error> {
    let start_time = Instant::now();
    println!("🌱 Starting database seeding...\n");

    let courses = courses::seed_courses(db, config.num_courses).await?;
    let academic_years = academic_years::seed_academic_years(
        db,
        config.num_academic_years,
        config.latest_starting_year,
    )
    .await?;
    let students =
        students::seed_students(db, &courses, &academic_years, config.students_per_course)
            .await?;

    println!("\n✅ Seeding completed in {:?}", start_time.elapsed());

    Ok(SeedSummary {
        courses: courses.len(),
        academic_years: academic_years.len(),
        students,
    })
}

/// Removes every student, academic year and course.
pub async fn clear_seeded_data(db: &PgPool) -> Result<(), sqlx::Error> {
    let start_time = Instant::now();
    println!("🧹 Clearing seeded data...\n");

    students::clear_students(db).await?;
    academic_years::clear_academic_years(db).await?;
    courses::clear_courses(db).await?;

    println!("\n✅ Cleared all seeded data in {:?}", start_time.elapsed());
    Ok(())
}
