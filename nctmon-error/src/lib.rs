//! Unified error handling for nctmon
//!
//! This crate provides the single error type used by the driver and its
//! platform backends. It uses thiserror for the Display and Error impls.

use std::io;
use std::path::PathBuf;

/// Result type alias using NctError
pub type Result<T> = std::result::Result<T, NctError>;

/// Unified error type for all nctmon operations
#[derive(thiserror::Error, Debug)]
pub enum NctError {
    // ============================================================================
    // I/O and Port Access Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Port access failed at 0x{port:04X}: {source}")]
    PortAccess {
        port: u16,
        source: io::Error,
    },

    #[error("Failed to open {path}: {source}")]
    DeviceOpen {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Bus lock file error at {path}: {source}")]
    BusLock {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Driver Usage Errors
    // ============================================================================
    #[error("Control channel {index} out of range (chip exposes {count})")]
    ChannelOutOfRange {
        index: usize,
        count: usize,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    // ============================================================================
    // Environment Errors
    // ============================================================================
    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl NctError {
    /// Create an invalid configuration error for a named field
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error raised while touching a hardware port
    pub fn port(port: u16, source: io::Error) -> Self {
        Self::PortAccess { port, source }
    }

    /// True for programming errors the caller should fix, as opposed to
    /// hardware or environment conditions.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::ChannelOutOfRange { .. } | Self::InvalidConfig { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_out_of_range_message() {
        let err = NctError::ChannelOutOfRange { index: 9, count: 7 };
        assert_eq!(err.to_string(), "Control channel 9 out of range (chip exposes 7)");
        assert!(err.is_usage_error());
    }

    #[test]
    fn test_port_access_message() {
        let err = NctError::port(0x2A5, io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(err.to_string(), "Port access failed at 0x02A5: boom");
        assert!(!err.is_usage_error());
    }

    #[test]
    fn test_invalid_config_helper() {
        let err = NctError::invalid_config("ec_settle_delay_ms", "must be non-zero");
        assert!(matches!(err, NctError::InvalidConfig { ref field, .. } if field == "ec_settle_delay_ms"));
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<u8, _> = serde_json::from_str("nope");
        let err: NctError = parse.unwrap_err().into();
        assert!(matches!(err, NctError::JsonParse(_)));
    }
}
