//! Academic years module.
//!
//! The starting year of an academic year's label is the `YYYY` prefix of
//! every admission number issued in it.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use router::init_academic_years_router;
