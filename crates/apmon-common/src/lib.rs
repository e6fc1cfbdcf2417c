pub mod stats;
pub mod types;
