//! Configuration loader
//!
//! Loading pipeline:
//! 1. Size check and raw read
//! 2. YAML parsing into [`ControllerConfig`]
//! 3. Validation (all issues collected)
//! 4. Resolution into a [`CycleTiming`]
//!
//! Configs assembled elsewhere (e.g. CLI overrides) go through stages 3–4
//! via [`resolve`].

use std::path::Path;

use crate::config::schema::ControllerConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;
use crate::phase::timing::{self, DEFAULT_MAX_CYCLE, DEFAULT_MIN_CYCLE, DEFAULT_POLL};
use crate::phase::CycleTiming;

// ============================================================================
// Public API
// ============================================================================

/// Options for the configuration loader.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_config_size: env_or("PHASELIGHT_MAX_CONFIG_SIZE", 64 * 1024),
        }
    }
}

/// Result of loading a configuration.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: ControllerConfig,

    /// Timing resolved from the configuration.
    pub timing: CycleTiming,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a new configuration loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Loads, validates, and resolves a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file exceeds the size limit
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|e| read_error(path, e))?;

        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > self.options.max_config_size {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {} bytes", self.options.max_config_size),
            });
        }

        let raw_content = std::fs::read_to_string(path).map_err(|e| read_error(path, e))?;

        // Handle UTF-8 BOM
        let raw_content = raw_content.strip_prefix('\u{feff}').unwrap_or(&raw_content);

        // An empty file means "all defaults".
        let config: ControllerConfig = if raw_content.trim().is_empty() {
            ControllerConfig::default()
        } else {
            serde_yaml::from_str(raw_content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?
        };

        resolve(config, &path.display().to_string())
    }
}

/// Validates a configuration and resolves its timing.
///
/// `origin` names the configuration in error messages.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] listing every issue if the
/// configuration is unusable.
pub fn resolve(config: ControllerConfig, origin: &str) -> Result<LoadResult, ConfigError> {
    let validation = Validator::new().validate(&config);
    if validation.has_errors() {
        return Err(ConfigError::ValidationError {
            path: origin.to_string(),
            errors: validation.errors,
        });
    }

    let warnings = validation
        .warnings
        .into_iter()
        .map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        })
        .collect();

    let timing = build_timing(&config)?;

    Ok(LoadResult {
        config,
        timing,
        warnings,
    })
}

/// Builds the cycle timing from a validated configuration.
fn build_timing(config: &ControllerConfig) -> Result<CycleTiming, ConfigError> {
    let min = duration_or(config.cycle.min.as_deref(), "cycle.min", DEFAULT_MIN_CYCLE)?;
    let max = duration_or(config.cycle.max.as_deref(), "cycle.max", DEFAULT_MAX_CYCLE)?;
    let poll = duration_or(config.cycle.poll.as_deref(), "cycle.poll", DEFAULT_POLL)?;

    let timing = CycleTiming::new(min, max, poll).map_err(|e| ConfigError::InvalidValue {
        field: "cycle".to_string(),
        value: format!("{min:?}..={max:?} every {poll:?}"),
        expected: e.to_string(),
    })?;

    Ok(match config.seed {
        Some(seed) => timing.with_seed(seed),
        None => timing,
    })
}

fn duration_or(
    raw: Option<&str>,
    field: &str,
    default: std::time::Duration,
) -> Result<std::time::Duration, ConfigError> {
    raw.map_or(Ok(default), |s| {
        timing::parse_duration(s).map_err(|_| ConfigError::InvalidValue {
            field: field.to_string(),
            value: s.to_string(),
            expected: "a duration such as 500ms or 4s".to_string(),
        })
    })
}

fn read_error(path: &Path, source: std::io::Error) -> ConfigError {
    if source.kind() == std::io::ErrorKind::NotFound {
        ConfigError::MissingFile {
            path: path.to_path_buf(),
        }
    } else {
        ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
