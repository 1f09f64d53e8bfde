//! Metrics collection for `phaselight`.
//!
//! Records phase transitions, observer releases, and cycle durations through
//! the `metrics` facade, with an optional Prometheus exporter.

use std::sync::atomic::{AtomicBool, Ordering};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::PhaseLightError;
use crate::phase::{Phase, PhaseTransition};

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without
/// an HTTP endpoint. Must be called from within a Tokio runtime when a
/// port is given.
///
/// # Errors
///
/// Returns `PhaseLightError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), PhaseLightError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| PhaseLightError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "phaselight_transitions_total",
        "Total number of phase transitions"
    );
    describe_gauge!(
        "phaselight_current_phase",
        "Current phase (0 = red, 1 = green)"
    );
    describe_histogram!(
        "phaselight_cycle_duration_ms",
        "Measured time spent in a phase before flipping"
    );
    describe_counter!(
        "phaselight_observer_releases_total",
        "Observers released after receiving their target phase"
    );
}

/// Records a phase transition and updates the current-phase gauge.
pub fn record_transition(transition: &PhaseTransition) {
    counter!(
        "phaselight_transitions_total",
        "from" => transition.from.as_str(),
        "to" => transition.to.as_str()
    )
    .increment(1);
    set_current_phase(transition.to);
    histogram!("phaselight_cycle_duration_ms")
        .record(transition.elapsed.as_secs_f64() * 1000.0);
}

/// Sets the current-phase gauge.
pub fn set_current_phase(phase: Phase) {
    gauge!("phaselight_current_phase").set(f64::from(u8::from(phase)));
}

/// Records an observer being released by its target phase.
pub fn record_observer_release(phase: Phase) {
    counter!("phaselight_observer_releases_total", "phase" => phase.as_str()).increment(1);
}
