pub use admitrack_models::students::*;
