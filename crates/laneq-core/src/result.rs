//! Result type aliases for laneq.

use crate::LaneqError;

/// A specialized `Result` type for laneq operations.
pub type LaneqResult<T> = Result<T, LaneqError>;
