use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use dotenvy::dotenv;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use admitrack::db::run_migrations;
use admitrack::modules::admission_numbers::{AdmissionAllocator, PgAdmissionStore};
use admitrack::state::Allocator;
use admitrack_cli::seeder::{self, SeedConfig};
use admitrack_config::{AllocatorConfig, DatabaseConfig, RegenerationMode};
use admitrack_db::init_db_pool;
use admitrack_models::{AcademicYearId, CourseId};

#[derive(Parser)]
#[command(name = "admitrack-cli")]
#[command(about = "Admitrack CLI - Admission number and database tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the next admission number for a course and academic year
    Preview {
        /// Course code, e.g. CS
        #[arg(short = 'c', long)]
        course: String,

        /// Academic year label, e.g. 2024-2025
        #[arg(short = 'y', long)]
        academic_year: String,
    },
    /// Check whether an admission number belongs to a known course
    Validate {
        /// Admission number, e.g. 2024CS001
        number: String,
    },
    /// Renumber an academic year's automatically numbered students by surname
    Regenerate {
        /// Academic year label, e.g. 2024-2025
        #[arg(short = 'y', long)]
        academic_year: String,

        /// Only renumber this course
        #[arg(short = 'c', long)]
        course: Option<String>,

        /// atomic or per_record (defaults to ADMISSION_REGENERATION_MODE)
        #[arg(short = 'm', long)]
        mode: Option<RegenerationMode>,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Apply pending database migrations
    Migrate,
    /// Seed the database with courses, academic years and numbered students
    Seed {
        /// Number of courses from the built-in catalogue
        #[arg(short = 'c', long, default_value = "4")]
        courses: usize,

        /// Number of consecutive academic years
        #[arg(short = 'y', long, default_value = "2")]
        years: usize,

        /// Starting year of the most recent academic year
        #[arg(long, default_value = "2024")]
        latest_year: i32,

        /// Number of students per course and academic year
        #[arg(short = 's', long, default_value = "25")]
        students: usize,
    },
    /// Delete all students, academic years and courses
    ClearSeed {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let pool = init_db_pool(&DatabaseConfig::from_env()).await;

    match cli.command {
        Commands::Preview {
            course,
            academic_year,
        } => handle_preview(&pool, &course, &academic_year).await,
        Commands::Validate { number } => handle_validate(&pool, &number).await,
        Commands::Regenerate {
            academic_year,
            course,
            mode,
            yes,
        } => handle_regenerate(&pool, &academic_year, course.as_deref(), mode, yes).await,
        Commands::Migrate => handle_migrate(&pool).await,
        Commands::Seed {
            courses,
            years,
            latest_year,
            students,
        } => handle_seed(&pool, courses, years, latest_year, students).await,
        Commands::ClearSeed { yes } => handle_clear_seed(&pool, yes).await,
    }
}

fn allocator(pool: &PgPool) -> Allocator {
    AdmissionAllocator::new(PgAdmissionStore::new(pool.clone()), AllocatorConfig::from_env())
}

async fn find_course_id(pool: &PgPool, code: &str) -> anyhow::Result<CourseId> {
    let code = code.trim().to_uppercase();
    sqlx::query_scalar::<_, CourseId>("SELECT id FROM courses WHERE course_code = $1")
        .bind(&code)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("Course {code} not found"))
}

async fn find_academic_year_id(pool: &PgPool, label: &str) -> anyhow::Result<AcademicYearId> {
    let label = label.trim();
    sqlx::query_scalar::<_, AcademicYearId>("SELECT id FROM academic_years WHERE academic_year = $1")
        .bind(label)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("Academic year {label} not found"))
}

fn confirm(prompt: &str, yes: bool) -> anyhow::Result<bool> {
    if yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

async fn handle_preview(pool: &PgPool, course: &str, academic_year: &str) -> anyhow::Result<()> {
    let course_id = find_course_id(pool, course).await?;
    let academic_year_id = find_academic_year_id(pool, academic_year).await?;

    let next = allocator(pool)
        .preview_next(course_id, academic_year_id)
        .await;
    println!("{next}");
    Ok(())
}

async fn handle_validate(pool: &PgPool, number: &str) -> anyhow::Result<()> {
    match allocator(pool).parse(number).await? {
        Some(parts) => {
            println!("✅ {} is valid", number);
            println!("   Course: {}", parts.course_code);
            println!("   Year: {}", parts.year);
            println!("   Serial: {} ({})", parts.serial, parts.formatted_serial);
            Ok(())
        }
        None => bail!("{number} does not match any course"),
    }
}

async fn handle_regenerate(
    pool: &PgPool,
    academic_year: &str,
    course: Option<&str>,
    mode: Option<RegenerationMode>,
    yes: bool,
) -> anyhow::Result<()> {
    let academic_year_id = find_academic_year_id(pool, academic_year).await?;
    let course_id = match course {
        Some(code) => Some(find_course_id(pool, code).await?),
        None => None,
    };

    let allocator = allocator(pool);
    let mode = mode.unwrap_or(allocator.config().regeneration_mode);
    let scope = course.map_or_else(
        || "all courses".to_string(),
        |code| format!("course {}", code.to_uppercase()),
    );

    println!("⚠️  This rewrites the admission numbers of every automatically numbered student");
    println!("   in {academic_year} ({scope}), ordered by surname. Mode: {mode}");
    if !confirm("Continue?", yes)? {
        println!("Aborted.");
        return Ok(());
    }

    let summary = allocator
        .regenerate_for_year_with_mode(academic_year_id, course_id, mode)
        .await?;

    println!("\n✅ Regeneration complete");
    println!("   Updated:   {}", summary.updated);
    println!("   Unchanged: {}", summary.unchanged);
    println!("   Skipped:   {}", summary.skipped);
    println!("   Failed:    {}", summary.failed);
    Ok(())
}

async fn handle_migrate(pool: &PgPool) -> anyhow::Result<()> {
    run_migrations(pool)
        .await
        .context("Failed to run migrations")?;
    println!("✅ Migrations applied");
    Ok(())
}

async fn handle_seed(
    pool: &PgPool,
    courses: usize,
    years: usize,
    latest_year: i32,
    students: usize,
) -> anyhow::Result<()> {
    let config = SeedConfig::new(courses)
        .with_academic_years(years, latest_year)
        .with_students_per_course(students);

    let summary = seeder::seed_all(pool, config)
        .await
        .context("Seeding failed")?;

    println!(
        "   {} courses, {} academic years, {} students",
        summary.courses, summary.academic_years, summary.students
    );
    Ok(())
}

async fn handle_clear_seed(pool: &PgPool, yes: bool) -> anyhow::Result<()> {
    if !confirm(
        "Delete ALL students, academic years and courses?",
        yes,
    )? {
        println!("Aborted.");
        return Ok(());
    }

    seeder::clear_seeded_data(pool)
        .await
        .context("Failed to clear seeded data")?;
    Ok(())
}
