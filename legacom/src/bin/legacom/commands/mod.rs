pub mod mapping;
pub mod types;
