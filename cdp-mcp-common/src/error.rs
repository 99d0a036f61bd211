//! Error types for the common library.
//!
//! This module provides a unified error hierarchy using `thiserror` for consistent
//! error handling across the CDP MCP server.
//!
//! # Error Categories
//!
//! - `ConfigError`: Invalid configuration values
//! - `Error::Validation`: Input validation failures
//! - `Error::Io`: File system operations
//! - `Error::ProgramNotFound`: CDP program missing from the install directory
//! - `Error::Process`: Spawning or waiting on a CDP program failed
//! - `Error::Audio`: Sound file could not be decoded

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the common library.
///
/// Tool handlers never surface these to the agent as protocol errors; the
/// server renders them into the structured `error` field of a tool result.
#[derive(Debug, Error)]
pub enum Error {
    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// File system I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The named program does not exist under the CDP install directory
    #[error("Program '{program}' not found at {}", path.display())]
    ProgramNotFound {
        /// Program name as given by the caller
        program: String,
        /// Path that was checked
        path: PathBuf,
    },

    /// Subprocess could not be spawned or awaited
    #[error("Execution failed: {0}")]
    Process(String),

    /// Sound file decoding errors
    #[error("Audio error: {0}")]
    Audio(String),
}

impl Error {
    /// Create a new validation error.
    ///
    /// # Example
    ///
    /// ```
    /// use cdp_mcp_common::error::Error;
    ///
    /// let err = Error::validation("command cannot be empty");
    /// assert!(err.to_string().contains("command cannot be empty"));
    /// ```
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Create a new program-not-found error.
    ///
    /// # Example
    ///
    /// ```
    /// use cdp_mcp_common::error::Error;
    ///
    /// let err = Error::program_not_found("blur", "/opt/cdp/blur");
    /// assert_eq!(err.to_string(), "Program 'blur' not found at /opt/cdp/blur");
    /// ```
    pub fn program_not_found(program: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Error::ProgramNotFound {
            program: program.into(),
            path: path.into(),
        }
    }

    /// Create a new process error.
    pub fn process(message: impl Into<String>) -> Self {
        Error::Process(message.into())
    }

    /// Create a new audio decoding error.
    pub fn audio(message: impl Into<String>) -> Self {
        Error::Audio(message.into())
    }

    /// Whether this error means the program binary was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ProgramNotFound { .. })
    }
}

/// Configuration errors.
///
/// Raised while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl ConfigError {
    /// Create a new invalid value error.
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue(name.into(), reason.into())
    }
}

/// Result type alias using the unified Error type.
pub type Result<T> = std::result::Result<T, Error>;
