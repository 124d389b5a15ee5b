use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    admission_number_exists, generate_admission_number, parse_admission_number,
    preview_next_admission_number, regenerate_admission_numbers, validate_admission_number,
};

pub fn init_admission_numbers_router() -> Router<AppState> {
    Router::new()
        .route("/next", get(preview_next_admission_number))
        .route("/generate", get(generate_admission_number))
        .route("/regenerate", post(regenerate_admission_numbers))
        .route("/{number}", get(parse_admission_number))
        .route("/{number}/validate", get(validate_admission_number))
        .route("/{number}/exists", get(admission_number_exists))
}
