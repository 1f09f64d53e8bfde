//! `validate` command handler
//!
//! Loads each configuration file through the full pipeline without
//! starting a controller.

use crate::cli::args::ValidateArgs;
use crate::config::ConfigLoader;
use crate::error::PhaseLightError;

/// Validate every file named on the command line.
///
/// Stops at the first invalid file.
///
/// # Errors
///
/// Returns an I/O error if a file does not exist, or a config error if a
/// file fails to parse or validate.
pub fn run(args: &ValidateArgs) -> Result<(), PhaseLightError> {
    let loader = ConfigLoader::default();

    for path in &args.files {
        if !path.exists() {
            return Err(PhaseLightError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            )));
        }
        tracing::info!(file = %path.display(), "validating configuration");

        let load_result = loader.load(path)?;
        for warning in &load_result.warnings {
            tracing::warn!(
                location = warning.location.as_deref().unwrap_or("<unknown>"),
                "{}",
                warning.message
            );
        }

        tracing::info!(
            file = %path.display(),
            initial = %load_result.config.initial_phase,
            min = %humantime::format_duration(load_result.timing.min()),
            max = %humantime::format_duration(load_result.timing.max()),
            "configuration valid"
        );
    }

    Ok(())
}
