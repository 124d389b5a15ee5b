//! Students module.
//!
//! Students are admitted through the admission number allocator; this module
//! covers listing, editing and removing them.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use router::init_students_router;
