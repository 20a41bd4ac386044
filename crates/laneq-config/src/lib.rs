//! # Laneq Config
//!
//! Configuration management for laneq.
//! Supports layered configuration from files and environment variables,
//! validated as a whole before anything starts.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
