//! # Admitrack Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`allocator`]: Admission-number allocator policies
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`database`]: PostgreSQL connection settings
//! - [`server`]: HTTP and metrics listener addresses
//!
//! # Example
//!
//! ```ignore
//! use admitrack_config::{AllocatorConfig, CorsConfig, DatabaseConfig, ServerConfig};
//!
//! let allocator = AllocatorConfig::from_env();
//! let database = DatabaseConfig::from_env();
//! ```

pub mod allocator;
pub mod cors;
pub mod database;
pub mod server;

pub use allocator::{AllocatorConfig, OverflowPolicy, RegenerationMode};
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use server::ServerConfig;
