pub mod academic_years;
pub mod admission_numbers;
pub mod courses;
pub mod students;
