//! Result and error types for HEXL.

use thiserror::Error;

/// Result type for HEXL operations
pub type HexlResult<T> = Result<T, HexlError>;

/// Errors that can occur in HEXL
///
/// Search exhaustion is never an error; it is reported through `bool`/`Option`
/// returns. These variants cover data that enters the core from outside.
#[derive(Debug, Error)]
pub enum HexlError {
    /// Opcode is not described by the instruction set
    #[error("Unknown opcode: {opcode}")]
    UnknownOpcode {
        /// Opcode value or name
        opcode: String,
    },

    /// Property is not described for the opcode
    #[error("Unknown property {prop} for opcode {opcode}")]
    UnknownProperty {
        /// Opcode value or name
        opcode: String,
        /// Property id
        prop: u32,
    },

    /// Instruction table is malformed
    #[error("Invalid instruction table: {message}")]
    InvalidTable {
        /// Error message
        message: String,
    },

    /// Grid geometry cannot be constructed
    #[error("Invalid grid geometry: {message}")]
    InvalidGeometry {
        /// Error message
        message: String,
    },

    /// Base-format variant requested for an opcode without a Mod format
    #[error("Opcode {opcode} has no base-format variant (format is {format})")]
    NoBaseVariant {
        /// Opcode name
        opcode: String,
        /// Actual format
        format: String,
    },

    /// Saved search state does not match the instruction description
    #[error("Search state mismatch: {message}")]
    StateMismatch {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl HexlError {
    /// Create an invalid table error
    #[must_use]
    pub fn invalid_table(message: impl Into<String>) -> Self {
        Self::InvalidTable {
            message: message.into(),
        }
    }

    /// Create an invalid geometry error
    #[must_use]
    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
