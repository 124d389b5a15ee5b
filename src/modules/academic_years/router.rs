use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_academic_year, delete_academic_year, get_academic_year_by_id, get_academic_years,
    update_academic_year,
};

pub fn init_academic_years_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_academic_years).post(create_academic_year))
        .route(
            "/{id}",
            get(get_academic_year_by_id)
                .put(update_academic_year)
                .delete(delete_academic_year),
        )
}
