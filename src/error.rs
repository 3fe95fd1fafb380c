//! # Error Types
//!
//! This module defines the error and warning types used throughout the
//! cuadrado library.
//!
//! Every failure carries a numeric code next to its message. Downstream
//! tooling matches on both, so the wording of each message is stable:
//!
//! | Range | Concern |
//! |-------|---------|
//! | 2xx | Empty input, implicit ECI warnings |
//! | 5xx | Options, GS1 data, capacity overflow |
//! | 7xx | Structured Append and framing conflicts |

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Main error type for encode operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The input does not fit in any permitted symbol size
    #[error("Error {code}: {message}")]
    TooLong { code: u16, message: String },

    /// Conflicting or out-of-range configuration
    #[error("Error {code}: {message}")]
    InvalidOption { code: u16, message: String },

    /// A byte outside the alphabet allowed by the chosen input mode
    #[error("Error {code}: {message}")]
    InvalidData { code: u16, message: String },
}

impl EncodeError {
    pub(crate) fn too_long(code: u16, message: impl Into<String>) -> Self {
        Self::TooLong {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_option(code: u16, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_data(code: u16, message: impl Into<String>) -> Self {
        Self::InvalidData {
            code,
            message: message.into(),
        }
    }

    /// Numeric error code.
    pub fn code(&self) -> u16 {
        match self {
            Self::TooLong { code, .. }
            | Self::InvalidOption { code, .. }
            | Self::InvalidData { code, .. } => *code,
        }
    }

    /// Message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::TooLong { message, .. }
            | Self::InvalidOption { message, .. }
            | Self::InvalidData { message, .. } => message,
        }
    }
}

/// A non-fatal condition reported alongside a successful encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub code: u16,
    pub message: String,
}

impl Warning {
    pub(crate) fn new(code: u16, message: impl Into<String>) -> Self {
        let warning = Self {
            code,
            message: message.into(),
        };
        tracing::warn!(code = warning.code, "{}", warning.message);
        warning
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Warning {}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = EncodeError::too_long(719, "Input length 3117 too long (maximum 3116)");
        assert_eq!(
            err.to_string(),
            "Error 719: Input length 3117 too long (maximum 3116)"
        );
        assert_eq!(err.code(), 719);
        assert_eq!(err.message(), "Input length 3117 too long (maximum 3116)");
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::new(222, "ECI 0 after ECI 26 encoded as ECI 3");
        assert_eq!(
            warning.to_string(),
            "Warning 222: ECI 0 after ECI 26 encoded as ECI 3"
        );
    }
}
