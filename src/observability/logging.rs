//! Logging setup.
//!
//! Everything goes to stderr so stdout stays free for command output
//! (`version`, `completions`). `PHASELIGHT_LOG_LEVEL` takes an `EnvFilter`
//! directive and wins over `-v` flags.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the verbosity flags.
pub const LOG_LEVEL_ENV: &str = "PHASELIGHT_LOG_LEVEL";

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, optionally colored.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

/// Logging options resolved from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogSettings {
    /// Output format.
    pub format: LogFormat,
    /// Number of `-v` flags.
    pub verbosity: u8,
    /// Emit ANSI color codes (human format only).
    pub ansi: bool,
}

impl LogSettings {
    /// Directive used when `PHASELIGHT_LOG_LEVEL` is unset.
    #[must_use]
    pub const fn default_directive(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Targets and thread names are shown from `-vv` on; the cycling thread
    /// is named, so this tells its lines apart from observers.
    #[must_use]
    pub const fn show_origin(&self) -> bool {
        self.verbosity >= 2
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_LEVEL_ENV)
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

/// Installs the global tracing subscriber.
///
/// Later calls are ignored, so tests may call this freely.
pub fn init_logging(settings: LogSettings) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter())
        .with_target(settings.show_origin())
        .with_writer(std::io::stderr);

    let _ = match settings.format {
        LogFormat::Human => builder
            .with_ansi(settings.ansi)
            .with_thread_names(settings.show_origin())
            .try_init(),
        LogFormat::Json => builder.json().with_thread_names(true).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(verbosity: u8) -> LogSettings {
        LogSettings {
            verbosity,
            ..LogSettings::default()
        }
    }

    #[test]
    fn verbosity_maps_to_directive() {
        assert_eq!(settings(0).default_directive(), "warn");
        assert_eq!(settings(1).default_directive(), "info");
        assert_eq!(settings(2).default_directive(), "debug");
        assert_eq!(settings(3).default_directive(), "trace");
        assert_eq!(settings(u8::MAX).default_directive(), "trace");
    }

    #[test]
    fn origin_shown_from_debug_level() {
        assert!(!settings(1).show_origin());
        assert!(settings(2).show_origin());
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(settings(0));
        init_logging(LogSettings {
            format: LogFormat::Json,
            verbosity: 3,
            ansi: false,
        });
    }
}
