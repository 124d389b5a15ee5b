pub mod controller;
pub mod locks;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory_store;
pub mod model;
pub mod pg_store;
pub mod router;
pub mod service;
pub mod store;

pub use pg_store::PgAdmissionStore;
pub use router::init_admission_numbers_router;
pub use service::{AdmissionAllocator, AllocationError};
pub use store::{AdmissionStore, StoreError};
