use std::sync::Arc;

use sqlx::PgPool;

use admitrack_config::{AllocatorConfig, CorsConfig};

use crate::modules::admission_numbers::{AdmissionAllocator, PgAdmissionStore};

pub type Allocator = AdmissionAllocator<PgAdmissionStore>;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub allocator: Arc<Allocator>,
    pub cors_config: CorsConfig,
}

impl AppState {
    pub fn new(db: PgPool, allocator_config: AllocatorConfig, cors_config: CorsConfig) -> Self {
        let allocator = AdmissionAllocator::new(PgAdmissionStore::new(db.clone()), allocator_config);
        Self {
            db,
            allocator: Arc::new(allocator),
            cors_config,
        }
    }
}
