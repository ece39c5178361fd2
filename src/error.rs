//! Unified error types for satring

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for satring operations
#[derive(Error, Debug)]
pub enum SatRingError {
    /// Ring storage could not be allocated
    #[error("Failed to allocate {bytes} bytes of ring storage")]
    Allocation { bytes: usize },

    /// Safety margin must be even and at least 2 frames
    #[error("Invalid safety margin: {0} frames (must be even and >= 2)")]
    InvalidSafetyMargin(usize),

    /// Geometry parameter out of range
    #[error("Invalid ring geometry: {0}")]
    InvalidGeometry(String),

    /// Derived byte size does not fit in usize
    #[error("Ring capacity overflows addressable memory")]
    CapacityOverflow,

    /// Configuration file error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Stream thread or channel error
    #[error("Stream error: {0}")]
    Stream(String),

    /// Engine already running
    #[error("Stream engine already running")]
    AlreadyRunning,

    /// Engine not running
    #[error("Stream engine not running")]
    NotRunning,
}

/// Result type alias for satring operations
pub type Result<T> = std::result::Result<T, SatRingError>;

impl SatRingError {
    /// Create a geometry error with context
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry(message.into())
    }

    /// Check if this error is recoverable (can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SatRingError::Allocation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_allocation_is_recoverable() {
        assert!(SatRingError::Allocation { bytes: 24 }.is_recoverable());
        assert!(!SatRingError::InvalidSafetyMargin(3).is_recoverable());
        assert!(!SatRingError::CapacityOverflow.is_recoverable());
        assert!(!SatRingError::AlreadyRunning.is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = SatRingError::InvalidSafetyMargin(3);
        assert_eq!(
            err.to_string(),
            "Invalid safety margin: 3 frames (must be even and >= 2)"
        );

        let err = SatRingError::geometry("channels must be > 0");
        assert_eq!(err.to_string(), "Invalid ring geometry: channels must be > 0");
    }
}
