//! # Laneq Server Library
//!
//! Wires the job queue components from configuration and provides the
//! demo email handler run by the `laneq-server` binary.

pub mod app;
pub mod handler;
pub mod startup;
