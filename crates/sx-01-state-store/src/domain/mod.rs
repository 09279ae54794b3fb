pub mod errors;
pub mod names;
pub mod store;
