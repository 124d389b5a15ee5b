pub use admitrack_models::academic_years::*;
