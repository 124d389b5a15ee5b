//! Courses module.
//!
//! A course's code and numbering format are stamped into every admission
//! number issued for it, so both are frozen once students are enrolled.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use router::init_courses_router;
