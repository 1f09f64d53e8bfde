//! CLI argument definitions
//!
//! All Clap derive structs for `phaselight` command-line parsing.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::{LogFormat, LogSettings};
use crate::phase::Phase;

// ============================================================================
// Root CLI
// ============================================================================

/// Two-phase timed controller with observers blocked on a handoff channel.
#[derive(Parser, Debug)]
#[command(name = "phaselight", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "PHASELIGHT_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true, env = "PHASELIGHT_LOG_FORMAT")]
    pub log_format: OutputFormat,
}

impl Cli {
    /// Logging options implied by the global flags.
    #[must_use]
    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            format: self.log_format.into(),
            verbosity: self.verbose,
            ansi: self.color.use_ansi(),
        }
    }
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a controller and watch it cycle.
    Run(RunArgs),

    /// Validate configuration files without starting a controller.
    Validate(ValidateArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Run Command
// ============================================================================

/// Arguments for `run`.
///
/// Flags override values from `--config`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to YAML configuration file.
    #[arg(short, long, env = "PHASELIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Phase the controller starts in.
    #[arg(long, env = "PHASELIGHT_INITIAL_PHASE")]
    pub initial_phase: Option<Phase>,

    /// Lower bound of a phase duration (e.g. 4000ms).
    #[arg(long, env = "PHASELIGHT_MIN_CYCLE")]
    pub min_cycle: Option<String>,

    /// Upper bound of a phase duration (e.g. 6s).
    #[arg(long, env = "PHASELIGHT_MAX_CYCLE")]
    pub max_cycle: Option<String>,

    /// Sleep between elapsed-time checks (e.g. 1ms).
    #[arg(long, env = "PHASELIGHT_POLL")]
    pub poll: Option<String>,

    /// Seed for reproducible interval draws.
    #[arg(long, env = "PHASELIGHT_SEED")]
    pub seed: Option<u64>,

    /// Phase the observers wait for.
    #[arg(long, default_value = "green")]
    pub wait_for: Phase,

    /// Number of observer threads blocked on the channel.
    #[arg(long, default_value_t = 1)]
    pub observers: usize,

    /// Stop after this many transitions (runs until interrupted otherwise).
    #[arg(long)]
    pub transitions: Option<u64>,

    /// Write JSONL events to this file.
    #[arg(long, env = "PHASELIGHT_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Expose Prometheus metrics on 127.0.0.1:<port>.
    #[arg(long, env = "PHASELIGHT_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

impl ColorChoice {
    /// Resolves `auto` against stderr and `NO_COLOR`.
    #[must_use]
    pub fn use_ansi(self) -> bool {
        match self {
            Self::Auto => {
                std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
            }
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

impl From<OutputFormat> for LogFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => Self::Human,
            OutputFormat::Json => Self::Json,
        }
    }
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bourne Again Shell.
    Bash,
    /// Z Shell.
    Zsh,
    /// Friendly Interactive Shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish.
    Elvish,
}
