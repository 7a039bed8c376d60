pub mod aggregate;
pub mod filter;
pub mod metrics;
pub mod pipeline;
pub mod statistics;
