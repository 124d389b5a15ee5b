//! Student seeding functionality.
//!
//! Seeded students are numbered the way a fresh renumbering would number
//! them: serials from 1 in byte-wise (surname, student name) order, per
//! course and academic year.

use chrono::{Duration, NaiveDate};
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;

use admitrack_models::admission_numbers::{CourseFormat, format_admission_number};

use super::models::{SeededAcademicYear, SeededCourse, StudentSeed};

const BATCH_SIZE: usize = 500;
const COLUMNS_PER_ROW: usize = 8;

/// Generates numbered students for every (course, academic year) pair in
/// parallel. Each pair gets at most its format's maximum serial.
pub fn generate_students(
    courses: &[SeededCourse],
    academic_years: &[SeededAcademicYear],
    students_per_course: usize,
) -> Vec<StudentSeed> {
    let pairs: Vec<(&SeededCourse, &SeededAcademicYear)> = courses
        .iter()
        .flat_map(|course| academic_years.iter().map(move |year| (course, year)))
        .collect();

    pairs
        .par_iter()
        .flat_map(|&(course, year)| generate_for_pair(course, year, students_per_course))
        .collect()
}

fn generate_for_pair(
    course: &SeededCourse,
    year: &SeededAcademicYear,
    students_per_course: usize,
) -> Vec<StudentSeed> {
    let format = CourseFormat::from_special_flag(course.is_special_format);
    let count = students_per_course.min(format.max_serial() as usize);

    let mut names: Vec<(String, String, String)> = (0..count)
        .map(|_| {
            let surname: String = LastName().fake();
            let student_name: String = FirstName().fake();
            let father_first: String = FirstName().fake();
            (surname, student_name, father_first)
        })
        .collect();
    names.sort();

    let term_start = NaiveDate::from_ymd_opt(year.starting_year, 7, 1).unwrap_or_default();
    let starting_year = year.starting_year.to_string();

    names
        .into_iter()
        .enumerate()
        .map(|(idx, (surname, student_name, father_first))| {
            let serial_no = idx as i32 + 1;
            StudentSeed {
                course_id: course.id,
                academic_year_id: year.id,
                admission_no: format_admission_number(
                    &starting_year,
                    &course.course_code,
                    format,
                    serial_no,
                ),
                serial_no,
                father_name: Some(format!("{} {}", father_first, surname)),
                surname,
                student_name,
                date_of_admission: term_start + Duration::days((idx % 45) as i64),
            }
        })
        .collect()
}

/// Seeds students for every (course, academic year) pair that has none yet.
pub async fn seed_students(
    db: &PgPool,
    courses: &[SeededCourse],
    academic_years: &[SeededAcademicYear],
    students_per_course: usize,
) -> Result<u64, sqlx::Error> {
    let start_time = Instant::now();

    let occupied: Vec<(admitrack_models::CourseId, admitrack_models::AcademicYearId)> =
        sqlx::query_as("SELECT DISTINCT course_id, academic_year_id FROM students")
            .fetch_all(db)
            .await?;
    let students: Vec<StudentSeed> =
        generate_students(courses, academic_years, students_per_course)
            .into_iter()
            .filter(|s| !occupied.contains(&(s.course_id, s.academic_year_id)))
            .collect();
    println!("🎓 Seeding {} students...", students.len());

    let mut tx = db.begin().await?;
    let mut inserted = 0;
    for chunk in students.chunks(BATCH_SIZE) {
        inserted += insert_students_chunk(&mut tx, chunk).await?;
    }

    tx.commit().await?;

    println!(
        "   ✓ Inserted {} students in {:?}",
        inserted,
        start_time.elapsed()
    );
    Ok(inserted)
}

async fn insert_students_chunk(
    tx: &mut Transaction<'_, Postgres>,
    students: &[StudentSeed],
) -> Result<u64, sqlx::Error> {
    if students.is_empty() {
        return Ok(0);
    }

    let mut query = String::from(
        "INSERT INTO students (course_id, academic_year_id, admission_no, serial_no, surname, \
         student_name, father_name, date_of_admission) VALUES ",
    );
    for i in 0..students.len() {
        if i > 0 {
            query.push_str(", ");
        }
        let base = i * COLUMNS_PER_ROW;
        let placeholders: Vec<String> = (1..=COLUMNS_PER_ROW)
            .map(|offset| format!("${}", base + offset))
            .collect();
        query.push_str(&format!("({})", placeholders.join(", ")));
    }

    let mut q = sqlx::query(&query);
    for student in students {
        q = q
            .bind(student.course_id)
            .bind(student.academic_year_id)
            .bind(&student.admission_no)
            .bind(student.serial_no)
            .bind(&student.surname)
            .bind(&student.student_name)
            .bind(&student.father_name)
            .bind(student.date_of_admission);
    }

    Ok(q.execute(&mut **tx).await?.rows_affected())
}

/// Clears all students and their allocation lock rows.
pub async fn clear_students(db: &PgPool) -> Result<u64, sqlx::Error> {
    let start_time = Instant::now();
    println!("🗑️  Clearing students...");

    let mut tx = db.begin().await?;
    let result = sqlx::query("DELETE FROM students")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM admission_sequences")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    println!(
        "   ✓ Deleted {} students in {:?}",
        result,
        start_time.elapsed()
    );
    Ok(result)
}
