pub use admitrack_models::courses::*;
