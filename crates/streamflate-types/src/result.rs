//! Result type alias for streamflate operations

use crate::Error;

/// Result type alias for streamflate operations
pub type Result<T> = std::result::Result<T, Error>;
