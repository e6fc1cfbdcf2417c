//! Orchestration for one apmon run: configuration, credentials, the
//! sequential pipeline and the terminal summary.

pub mod auth;
pub mod config;
pub mod pipeline;
pub mod summary;
