use utoipa::OpenApi;

use admitrack_config::{OverflowPolicy, RegenerationMode};
use admitrack_core::{ErrorResponse, PaginationMeta, PaginationParams};

use crate::modules::academic_years::model::{
    AcademicYear, AcademicYearWithStats, CreateAcademicYearDto, UpdateAcademicYearDto,
};
use crate::modules::admission_numbers::model::{
    AdmissionNumberExists, AdmissionNumberParts, AdmissionNumberValidity,
    GeneratedAdmissionNumber, NextAdmissionNumberResponse, RegenerateAdmissionNumbersDto,
    RegenerationSummary,
};
use crate::modules::courses::model::{Course, CourseWithStats, CreateCourseDto, UpdateCourseDto};
use crate::modules::students::model::{
    CreateStudentDto, PaginatedStudentsResponse, SerialSource, Student, StudentWithRelations,
    UpdateStudentDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_course_by_id,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::academic_years::controller::create_academic_year,
        crate::modules::academic_years::controller::get_academic_years,
        crate::modules::academic_years::controller::get_academic_year_by_id,
        crate::modules::academic_years::controller::update_academic_year,
        crate::modules::academic_years::controller::delete_academic_year,
        crate::modules::students::controller::create_student,
        crate::modules::students::controller::get_students,
        crate::modules::students::controller::get_student_by_id,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::delete_student,
        crate::modules::admission_numbers::controller::preview_next_admission_number,
        crate::modules::admission_numbers::controller::generate_admission_number,
        crate::modules::admission_numbers::controller::validate_admission_number,
        crate::modules::admission_numbers::controller::parse_admission_number,
        crate::modules::admission_numbers::controller::admission_number_exists,
        crate::modules::admission_numbers::controller::regenerate_admission_numbers,
    ),
    components(
        schemas(
            ErrorResponse,
            PaginationMeta,
            PaginationParams,
            Course,
            CourseWithStats,
            CreateCourseDto,
            UpdateCourseDto,
            AcademicYear,
            AcademicYearWithStats,
            CreateAcademicYearDto,
            UpdateAcademicYearDto,
            SerialSource,
            Student,
            StudentWithRelations,
            CreateStudentDto,
            UpdateStudentDto,
            PaginatedStudentsResponse,
            NextAdmissionNumberResponse,
            GeneratedAdmissionNumber,
            AdmissionNumberParts,
            AdmissionNumberValidity,
            AdmissionNumberExists,
            RegenerateAdmissionNumbersDto,
            RegenerationSummary,
            OverflowPolicy,
            RegenerationMode,
        )
    ),
    tags(
        (name = "Courses", description = "Course management; a course's code is embedded in its admission numbers"),
        (name = "Academic Years", description = "Academic year management; the starting year prefixes admission numbers"),
        (name = "Students", description = "Student admission and records"),
        (name = "Admission Numbers", description = "Admission number generation, lookup and bulk renumbering")
    ),
    info(
        title = "Admitrack API",
        version = "0.1.0",
        description = "Student admission records with per-course, per-year admission number allocation.",
        contact(
            name = "API Support",
            email = "support@admitrack.dev"
        ),
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/courses",
            "/api/courses/{id}",
            "/api/academic-years",
            "/api/academic-years/{id}",
            "/api/students",
            "/api/students/{id}",
            "/api/admission-numbers/next",
            "/api/admission-numbers/generate",
            "/api/admission-numbers/{number}",
            "/api/admission-numbers/{number}/validate",
            "/api/admission-numbers/{number}/exists",
            "/api/admission-numbers/regenerate",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
