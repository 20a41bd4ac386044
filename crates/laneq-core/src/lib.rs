//! # Laneq Core
//!
//! Core error types, result aliases and logging setup shared by every
//! laneq crate.

pub mod error;
pub mod result;
pub mod telemetry;

pub use error::*;
pub use result::*;
pub use telemetry::{init_logging, LogFormat, LoggingConfig};
