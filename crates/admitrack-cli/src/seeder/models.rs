//! Data models for database seeding configuration.

use admitrack_models::{AcademicYearId, CourseId};
use chrono::NaiveDate;

/// Seed data for creating a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSeed {
    pub course_name: &'static str,
    pub course_full_name: &'static str,
    pub course_code: &'static str,
    pub is_special_format: bool,
    pub course_type: &'static str,
    pub year: i32,
}

/// A course as needed to number seeded students.
#[derive(Debug, Clone)]
pub struct SeededCourse {
    pub id: CourseId,
    pub course_code: String,
    pub is_special_format: bool,
}

/// An academic year with its starting year, e.g. ("2024-2025", 2024).
#[derive(Debug, Clone)]
pub struct SeededAcademicYear {
    pub id: AcademicYearId,
    pub starting_year: i32,
}

/// Seed data for creating a numbered student.
#[derive(Debug, Clone)]
pub struct StudentSeed {
    pub course_id: CourseId,
    pub academic_year_id: AcademicYearId,
    pub admission_no: String,
    pub serial_no: i32,
    pub surname: String,
    pub student_name: String,
    pub father_name: Option<String>,
    pub date_of_admission: NaiveDate,
}

/// Complete configuration for database seeding.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// Courses taken from the front of the built-in catalogue
    pub num_courses: usize,
    /// Consecutive academic years ending with `latest_starting_year`
    pub num_academic_years: usize,
    pub latest_starting_year: i32,
    /// Capped at each course's maximum serial
    pub students_per_course: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            num_courses: 4,
            num_academic_years: 2,
            latest_starting_year: 2024,
            students_per_course: 25,
        }
    }
}

impl SeedConfig {
    pub fn new(num_courses: usize) -> Self {
        Self {
            num_courses,
            ..Default::default()
        }
    }

    pub fn with_academic_years(mut self, count: usize, latest_starting_year: i32) -> Self {
        self.num_academic_years = count;
        self.latest_starting_year = latest_starting_year;
        self
    }

    pub fn with_students_per_course(mut self, students: usize) -> Self {
        self.students_per_course = students;
        self
    }
}
