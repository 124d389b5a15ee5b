//! Academic year seeding functionality.

use sqlx::PgPool;
use std::time::Instant;

use admitrack_models::AcademicYearId;

use super::models::SeededAcademicYear;

/// `count` consecutive one-year labels ending with the one starting in
/// `latest_starting_year`, oldest first.
pub fn generate_labels(count: usize, latest_starting_year: i32) -> Vec<(String, i32)> {
    let count = i32::try_from(count).unwrap_or(i32::MAX);
    (0..count)
        .rev()
        .map(|back| latest_starting_year - back)
        .map(|start| (format!("{}-{}", start, start + 1), start))
        .collect()
}

/// Seeds academic years, reusing any that already exist with the same label.
pub async fn seed_academic_years(
    db: &PgPool,
    count: usize,
    latest_starting_year: i32,
) -> Result<Vec<SeededAcademicYear>, sqlx::Error> {
    let start_time = Instant::now();
    let labels = generate_labels(count, latest_starting_year);
    println!("📅 Seeding {} academic years...", labels.len());

    let mut tx = db.begin().await?;
    let mut seeded = Vec::with_capacity(labels.len());
    for (label, starting_year) in labels {
        let id = sqlx::query_scalar::<_, AcademicYearId>(
            r#"INSERT INTO academic_years (academic_year)
               VALUES ($1)
               ON CONFLICT (academic_year) DO UPDATE SET academic_year = EXCLUDED.academic_year
               RETURNING id"#,
        )
        .bind(&label)
        .fetch_one(&mut *tx)
        .await?;
        seeded.push(SeededAcademicYear { id, starting_year });
    }
    tx.commit().await?;

    println!(
        "   ✓ Seeded {} academic years in {:?}",
        seeded.len(),
        start_time.elapsed()
    );
    Ok(seeded)
}

pub async fn clear_academic_years(db: &PgPool) -> Result<u64, sqlx::Error> {
    let start_time = Instant::now();
    println!("🗑️  Clearing academic years...");

    let result = sqlx::query("DELETE FROM academic_years")
        .execute(db)
        .await?
        .rows_affected();

    println!(
        "   ✓ Deleted {} academic years in {:?}",
        result,
        start_time.elapsed()
    );
    Ok(result)
}
