//! # rootstat-core
//!
//! Core library for the rootstat status line providing the pieces every
//! sensor crate and the orchestrator share.
//!
//! ## Features
//!
//! - **Common sensor trait** - Standardized read/availability interface
//! - **Configuration management** - RON-based configuration with validation
//! - **Status line rendering** - Placeholder templates and time formatting
//! - **Waybar JSON output format** - Optional Waybar protocol output
//! - **Cooperative shutdown** - A cancellation token shared across tasks
//! - **Error handling** - Comprehensive error types with context
//!
//! ## Quick Start
//!
//! ```rust
//! use rootstat_core::{Sensor, SensorError};
//!
//! struct Uptime {
//!     name: String,
//! }
//!
//! impl Sensor for Uptime {
//!     type Reading = u64;
//!     type Error = SensorError;
//!
//!     fn read(&mut self) -> Result<u64, Self::Error> {
//!         Ok(42)
//!     }
//!
//!     fn name(&self) -> &str {
//!         &self.name
//!     }
//! }
//! ```

use serde::Serialize;

pub mod config;
pub mod format;
pub mod shutdown;

pub use config::{GlobalConfig, OutputTarget};
pub use shutdown::{Shutdown, ShutdownListener};

/// Standard Waybar output format compliant with Waybar's JSON protocol.
///
/// All fields except `text` are optional and will be omitted from JSON
/// serialization if they are `None`.
///
/// # Examples
///
/// ```rust
/// use rootstat_core::WaybarOutput;
///
/// let output = WaybarOutput::new("cpu 50%".to_string())
///     .with_tooltip("core 1: 50%")
///     .with_class("charging")
///     .with_percentage(50);
/// assert_eq!(output.percentage, Some(50));
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WaybarOutput {
    /// The main text to display in the bar
    pub text: String,
    /// Optional tooltip text shown on hover
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    /// Optional CSS class for styling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Optional percentage value (0-100) for progress indicators
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u8>,
}

impl WaybarOutput {
    /// Create a new WaybarOutput with just the required text field.
    #[must_use]
    pub const fn new(text: String) -> Self {
        Self {
            text,
            tooltip: None,
            class: None,
            percentage: None,
        }
    }

    /// Add a tooltip to this output.
    #[must_use]
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Add a CSS class to this output.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Add a percentage value to this output.
    ///
    /// Values above 100 are dropped rather than forwarded to Waybar.
    #[must_use]
    pub fn with_percentage(mut self, percentage: u8) -> Self {
        self.percentage = (percentage <= 100).then_some(percentage);
        self
    }
}

/// Trait for every value source feeding the status line.
///
/// A sensor produces one typed reading per call. Failing reads are expected
/// to be transient: callers keep the previous reading and try again on the
/// next tick.
pub trait Sensor {
    /// The value produced by a successful read.
    type Reading;

    /// Error type for sensor operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the current value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying pseudo-file or kernel interface
    /// cannot be read or parsed.
    fn read(&mut self) -> Result<Self::Reading, Self::Error>;

    /// Get the unique name/identifier for this sensor.
    fn name(&self) -> &str;

    /// Check if the sensor is available on this system.
    ///
    /// Default implementation returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor is not available or supported.
    fn check_availability(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Common error types for sensor operations.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// I/O error occurred while reading sensor data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing sensor data from text format.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of what failed to parse
        message: String,
        /// Optional source error for chaining
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error (invalid settings, etc.).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration issue
        message: String,
        /// The invalid configuration value if applicable
        value: Option<String>,
    },

    /// Sensor is not available on this system.
    #[error("Sensor unavailable: {reason}")]
    Unavailable {
        /// Reason why the sensor is unavailable
        reason: String,
        /// Whether this is a temporary or permanent condition
        is_temporary: bool,
    },

    /// Invalid data format or unexpected values.
    #[error("Invalid data: {message}")]
    InvalidData {
        /// Description of what makes the data invalid
        message: String,
        /// The invalid data if it can be safely displayed
        data: Option<String>,
    },
}

impl SensorError {
    /// Create a new parse error with a simple message.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new parse error with a source error.
    pub fn parse_with_source<S: Into<String>, E>(message: S, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error with the invalid value.
    pub fn config_with_value<S: Into<String>, V: Into<String>>(message: S, value: V) -> Self {
        Self::Config {
            message: message.into(),
            value: Some(value.into()),
        }
    }

    /// Create a new unavailable error.
    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self::Unavailable {
            reason: reason.into(),
            is_temporary: false,
        }
    }

    /// Create a new temporary unavailable error.
    pub fn temporarily_unavailable<S: Into<String>>(reason: S) -> Self {
        Self::Unavailable {
            reason: reason.into(),
            is_temporary: true,
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData {
            message: message.into(),
            data: None,
        }
    }

    /// Create a new invalid data error with the problematic data.
    pub fn invalid_data_with_value<S: Into<String>, D: Into<String>>(message: S, data: D) -> Self {
        Self::InvalidData {
            message: message.into(),
            data: Some(data.into()),
        }
    }

    /// Check if this error represents a temporary condition.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        match self {
            Self::Unavailable { is_temporary, .. } => *is_temporary,
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waybar_output_builder() {
        let output = WaybarOutput::new("50%".to_owned())
            .with_tooltip("CPU Usage: 50%")
            .with_class("charging")
            .with_percentage(50);

        assert_eq!(output.text, "50%");
        assert_eq!(output.tooltip, Some("CPU Usage: 50%".to_owned()));
        assert_eq!(output.class, Some("charging".to_owned()));
        assert_eq!(output.percentage, Some(50));
    }

    #[test]
    fn test_waybar_output_drops_out_of_range_percentage() {
        let output = WaybarOutput::new("x".to_owned()).with_percentage(150);
        assert_eq!(output.percentage, None);
    }

    #[test]
    fn test_waybar_output_skips_empty_fields() {
        let output = WaybarOutput::new("up".to_owned());
        let json = serde_json::to_string(&output).unwrap();
        assert_eq!(json, r#"{"text":"up"}"#);
    }

    #[test]
    fn test_sensor_error_constructors() {
        let err = SensorError::parse("Invalid format");
        assert!(matches!(err, SensorError::Parse { .. }));

        let err = SensorError::config_with_value("Invalid setting", "bad_value");
        assert!(matches!(err, SensorError::Config { .. }));

        let err = SensorError::temporarily_unavailable("Battery missing");
        assert!(err.is_temporary());

        let err = SensorError::unavailable("Not supported");
        assert!(!err.is_temporary());
    }

    #[test]
    fn test_io_error_classification() {
        let err = SensorError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!err.is_temporary());

        let err = SensorError::from(std::io::Error::new(std::io::ErrorKind::Interrupted, "eintr"));
        assert!(err.is_temporary());
    }
}
