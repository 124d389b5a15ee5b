//! # Admitrack Core
//!
//! Foundational types shared by every Admitrack crate:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Pagination utilities for list endpoints
//!
//! # Example
//!
//! ```ignore
//! use admitrack_core::errors::AppError;
//! use admitrack_core::pagination::PaginationParams;
//!
//! let error = AppError::not_found(anyhow::anyhow!("Course not found"));
//! let limit = PaginationParams::default().limit();
//! ```

pub mod errors;
pub mod pagination;

pub use errors::{AppError, ErrorResponse};
pub use pagination::{PaginationMeta, PaginationParams};
