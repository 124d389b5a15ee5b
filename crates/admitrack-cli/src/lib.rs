//! # Admitrack CLI
//!
//! Database seeding utilities for Admitrack testing and development.
//!
//! This library crate provides the seeding functionality used by the
//! `admitrack-cli` binary.
//!
//! ## Usage
//!
//! ```ignore
//! use admitrack_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(4).with_students_per_course(30);
//! seed_all(&pool, config).await?;
//! ```

pub mod seeder;
