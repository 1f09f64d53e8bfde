//! Error types for `phaselight`
//!
//! A small error hierarchy: configuration problems, handoff channel misuse,
//! and controller lifecycle failures, aggregated under [`PhaseLightError`]
//! with a CLI exit code mapping.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `phaselight` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Controller error (spawn failure, invalid phase, closed channel)
    pub const CONTROLLER_ERROR: i32 = 5;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `phaselight` operations.
#[derive(Debug, Error)]
pub enum PhaseLightError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Handoff channel error
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Phase controller error
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PhaseLightError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(ConfigError::MissingFile { .. } | ConfigError::Unreadable { .. })
            | Self::Io(_) => ExitCode::IO_ERROR,
            Self::Config(_) => ExitCode::CONFIG_ERROR,
            Self::Channel(_) | Self::Controller(_) => ExitCode::CONTROLLER_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}: {}", format_issues(.errors))]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Configuration file exists but could not be read
    #[error("cannot read {path}: {source}")]
    Unreadable {
        /// Path to the configuration file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "cycle.min")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - validation failure that prevents configuration from being used
    Error,
    /// Warning - potential issue that does not prevent configuration loading
    Warning,
}

// ============================================================================
// Channel Errors
// ============================================================================

/// Handoff channel errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The channel was closed; no further values will be delivered.
    #[error("handoff channel closed")]
    Closed,
}

// ============================================================================
// Controller Errors
// ============================================================================

/// Phase controller errors.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A value outside the two valid phases, or an unusable timing parameter
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The background cycling thread could not be spawned
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// `start_cycling` was called on a controller that already started
    #[error("cycling already started")]
    AlreadyStarted,

    /// The background cycling thread panicked
    #[error("cycling thread panicked")]
    WorkerPanicked,

    /// The controller's channel was closed while waiting
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

// ============================================================================
// Tests
// ============================================================================
