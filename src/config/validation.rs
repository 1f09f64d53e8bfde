//! Configuration validation
//!
//! Checks a deserialized [`ControllerConfig`] for unusable timing values.
//! Validation collects ALL issues (doesn't stop at first) to provide
//! comprehensive feedback.

use std::time::Duration;

use crate::config::schema::ControllerConfig;
use crate::error::{Severity, ValidationIssue};
use crate::phase::timing::{self, DEFAULT_MAX_CYCLE, DEFAULT_MIN_CYCLE, DEFAULT_POLL};

/// Poll quanta above this make transitions noticeably late.
pub const COARSE_POLL_THRESHOLD: Duration = Duration::from_millis(100);

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns all issues found.
    pub fn validate(&mut self, config: &ControllerConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        let min = self.duration_field(config.cycle.min.as_deref(), "cycle.min", DEFAULT_MIN_CYCLE);
        let max = self.duration_field(config.cycle.max.as_deref(), "cycle.max", DEFAULT_MAX_CYCLE);
        let poll = self.duration_field(config.cycle.poll.as_deref(), "cycle.poll", DEFAULT_POLL);

        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                self.add_error(
                    "cycle.min",
                    &format!(
                        "Minimum cycle {} exceeds maximum cycle {}",
                        humantime::format_duration(min),
                        humantime::format_duration(max)
                    ),
                );
            }
        }

        if let Some(poll) = poll {
            self.validate_poll(poll, min);
        }

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    /// Parses an optional duration field, recording an error if unusable.
    ///
    /// Returns the parsed value or `default` when absent; `None` if invalid.
    fn duration_field(
        &mut self,
        raw: Option<&str>,
        path: &str,
        default: Duration,
    ) -> Option<Duration> {
        let Some(raw) = raw else {
            return Some(default);
        };

        match timing::parse_duration(raw) {
            Ok(d) if d.is_zero() => {
                self.add_error(path, "Duration must be greater than zero");
                None
            }
            Ok(d) => Some(d),
            Err(_) => {
                self.add_error(
                    path,
                    &format!("Invalid duration '{raw}'. Expected e.g. 500ms, 4s, 1m 30s"),
                );
                None
            }
        }
    }

    fn validate_poll(&mut self, poll: Duration, min: Option<Duration>) {
        if let Some(min) = min {
            if poll >= min {
                self.add_error(
                    "cycle.poll",
                    "Poll quantum must be shorter than the minimum cycle",
                );
                return;
            }
        }

        if poll > COARSE_POLL_THRESHOLD {
            self.add_warning(
                "cycle.poll",
                &format!(
                    "Poll quantum {} is coarse; transitions may fire late",
                    humantime::format_duration(poll)
                ),
            );
        }
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Adds an error to the collection.
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}
