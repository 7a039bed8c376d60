pub mod cache;
pub mod columns;
pub mod datetime;
pub mod export;
pub mod loader;
pub mod values;
