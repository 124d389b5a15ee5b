//! Course seeding functionality.

use sqlx::PgPool;
use std::time::Instant;

use admitrack_models::CourseId;

use super::models::{CourseSeed, SeededCourse};

const CATALOGUE: &[CourseSeed] = &[
    CourseSeed {
        course_name: "Computer Science",
        course_full_name: "Bachelor of Science in Computer Science",
        course_code: "CS",
        is_special_format: false,
        course_type: "UG",
        year: 3,
    },
    CourseSeed {
        course_name: "Mechanical Engineering",
        course_full_name: "Bachelor of Engineering in Mechanical Engineering",
        course_code: "ME",
        is_special_format: false,
        course_type: "UG",
        year: 4,
    },
    CourseSeed {
        course_name: "Business Administration",
        course_full_name: "Master of Business Administration",
        course_code: "MBA",
        is_special_format: true,
        course_type: "PG",
        year: 2,
    },
    CourseSeed {
        course_name: "Commerce",
        course_full_name: "Bachelor of Commerce",
        course_code: "BC",
        is_special_format: false,
        course_type: "UG",
        year: 3,
    },
    CourseSeed {
        course_name: "Computer Science and Engineering",
        course_full_name: "Bachelor of Technology in Computer Science and Engineering",
        course_code: "CSE",
        is_special_format: true,
        course_type: "UG",
        year: 4,
    },
    CourseSeed {
        course_name: "Electrical Engineering",
        course_full_name: "Bachelor of Engineering in Electrical Engineering",
        course_code: "EE",
        is_special_format: false,
        course_type: "UG",
        year: 4,
    },
    CourseSeed {
        course_name: "Physics",
        course_full_name: "Master of Science in Physics",
        course_code: "MSP",
        is_special_format: true,
        course_type: "PG",
        year: 2,
    },
    CourseSeed {
        course_name: "English Literature",
        course_full_name: "Bachelor of Arts in English Literature",
        course_code: "EL",
        is_special_format: false,
        course_type: "UG",
        year: 3,
    },
];

/// The first `count` courses of the built-in catalogue.
pub fn catalogue(count: usize) -> &'static [CourseSeed] {
    &CATALOGUE[..count.min(CATALOGUE.len())]
}

/// Seeds courses, reusing any that already exist with the same code.
pub async fn seed_courses(db: &PgPool, count: usize) -> Result<Vec<SeededCourse>, sqlx::Error> {
    let start_time = Instant::now();
    let courses = catalogue(count);
    println!("📚 Seeding {} courses...", courses.len());

    let mut tx = db.begin().await?;
    let mut seeded = Vec::with_capacity(courses.len());
    for course in courses {
        let (id, course_code, is_special_format) =
            sqlx::query_as::<_, (CourseId, String, bool)>(
                r#"INSERT INTO courses (course_name, course_full_name, course_code, is_special_format, course_type, year)
                   VALUES ($1, $2, $3, $4, $5, $6)
                   ON CONFLICT (course_code) DO UPDATE SET course_code = EXCLUDED.course_code
                   RETURNING id, course_code, is_special_format"#,
            )
            .bind(course.course_name)
            .bind(course.course_full_name)
            .bind(course.course_code)
            .bind(course.is_special_format)
            .bind(course.course_type)
            .bind(course.year)
            .fetch_one(&mut *tx)
            .await?;

        seeded.push(SeededCourse {
            id,
            course_code,
            is_special_format,
        });
    }
    tx.commit().await?;

    println!(
        "   ✓ Seeded {} courses in {:?}",
        seeded.len(),
        start_time.elapsed()
    );
    Ok(seeded)
}

pub async fn clear_courses(db: &PgPool) -> Result<u64, sqlx::Error> {
    let start_time = Instant::now();
    println!("🗑️  Clearing courses...");

    let result = sqlx::query("DELETE FROM courses")
        .execute(db)
        .await?
        .rows_affected();

    println!("   ✓ Deleted {} courses in {:?}", result, start_time.elapsed());
    Ok(result)
}
