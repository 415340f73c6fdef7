//! Flow Sensor Error Types

use thiserror::Error;

/// Errors that can occur while talking to the flow sensor
#[derive(Debug, Error)]
pub enum FlowSensorError {
    /// Serial port I/O error
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Handshake returned something other than the expected identity
    #[error("Device mismatch: expected {expected:?}, got {actual:?}")]
    DeviceMismatch {
        expected: &'static str,
        actual: String,
    },

    /// Transport reached EOF before any response byte arrived
    #[error("Flow sensor not responding")]
    NoResponse,

    /// Transport reached EOF in the middle of a response line
    #[error("Response ended without newline terminator: {0:?}")]
    UnterminatedResponse(String),

    /// Response could not be decoded as ASCII text
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Operation issued after the connection was closed
    #[error("Flow sensor connection is closed")]
    NotConnected,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for FlowSensorError {
    fn from(err: std::io::Error) -> Self {
        FlowSensorError::SerialError(err.to_string())
    }
}

impl From<tokio_serial::Error> for FlowSensorError {
    fn from(err: tokio_serial::Error) -> Self {
        FlowSensorError::SerialError(err.to_string())
    }
}

impl From<::config::ConfigError> for FlowSensorError {
    fn from(err: ::config::ConfigError) -> Self {
        FlowSensorError::Config(err.to_string())
    }
}
