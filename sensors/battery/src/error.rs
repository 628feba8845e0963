//! Error handling for battery monitoring operations.

use nix::errno::Errno;
use std::io;
use thiserror::Error;

/// Error types for battery monitoring
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatteryError {
    /// I/O error during battery operations
    #[error("Battery I/O error: {message}")]
    Io { message: String },

    /// The power-supply event subscription could not be created or broke
    #[error("Power supply subscription failed: {reason}")]
    Subscription { reason: String },

    /// The kernel dropped events because the socket buffer was full
    #[error("Power supply events were lost")]
    Overflow,
}

impl BatteryError {
    /// Create an I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a subscription error
    pub fn subscription(reason: impl Into<String>) -> Self {
        Self::Subscription {
            reason: reason.into(),
        }
    }

    /// Whether changes may have happened that were never delivered.
    #[must_use]
    pub fn is_overflow(&self) -> bool {
        matches!(self, BatteryError::Overflow)
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            BatteryError::Io { .. } => "io",
            BatteryError::Subscription { .. } => "subscription",
            BatteryError::Overflow => "overflow",
        }
    }
}

impl From<io::Error> for BatteryError {
    fn from(err: io::Error) -> Self {
        if err.raw_os_error() == Some(Errno::ENOBUFS as i32) {
            return BatteryError::Overflow;
        }
        BatteryError::io(err.to_string())
    }
}

impl From<Errno> for BatteryError {
    fn from(err: Errno) -> Self {
        BatteryError::subscription(err.desc())
    }
}
