//! `run` command handler
//!
//! Starts a controller, blocks observer threads on it, and stops after a
//! transition limit or on interrupt.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::cli::args::RunArgs;
use crate::config::{self, ConfigLoader, ControllerConfig, LoadResult};
use crate::error::PhaseLightError;
use crate::observability::events::{Event, EventEmitter};
use crate::observability::metrics;
use crate::phase::{Phase, PhaseController};

/// How often the transition limit is checked.
const WATCH_INTERVAL: Duration = Duration::from_millis(10);

/// Start a controller and watch it cycle.
///
/// # Errors
///
/// Returns a config error if the configuration is invalid, an I/O error if
/// the events file or metrics endpoint cannot be opened, or a controller
/// error if the cycling thread cannot be started.
pub async fn run(args: &RunArgs, cancel: CancellationToken) -> Result<(), PhaseLightError> {
    if let Some(port) = args.metrics_port {
        metrics::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let loaded = load_config(args)?;
    for warning in &loaded.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }

    let emitter = Arc::new(match args.events_file {
        Some(ref path) => EventEmitter::from_file(path)?,
        None => EventEmitter::noop(),
    });

    let controller = Arc::new(
        PhaseController::with_timing(loaded.config.initial_phase, loaded.timing)
            .with_event_emitter(Arc::clone(&emitter)),
    );
    controller.start_cycling()?;
    tracing::info!(
        initial = %loaded.config.initial_phase,
        wait_for = %args.wait_for,
        observers = args.observers,
        "controller running"
    );

    let observers: Vec<_> = (0..args.observers)
        .map(|index| {
            let controller = Arc::clone(&controller);
            let emitter = Arc::clone(&emitter);
            let target = args.wait_for;
            tokio::task::spawn_blocking(move || observe(index, &controller, target, &emitter))
        })
        .collect();

    let reason = watch(&controller, args.transitions, &cancel).await;
    tracing::info!(reason, transitions = controller.transition_count(), "stopping controller");
    controller.shutdown_with_reason(reason)?;

    for (index, observer) in observers.into_iter().enumerate() {
        match observer.await {
            Ok(releases) => tracing::debug!(observer = index, releases, "observer finished"),
            Err(e) => tracing::warn!(observer = index, error = %e, "observer task failed"),
        }
    }

    Ok(())
}

/// Builds the effective configuration: file (or defaults) plus CLI overrides.
fn load_config(args: &RunArgs) -> Result<LoadResult, PhaseLightError> {
    let (mut config, origin) = match args.config {
        Some(ref path) => {
            tracing::info!(config = %path.display(), "loading configuration");
            let loaded = ConfigLoader::default().load(path)?;
            (loaded.config, path.display().to_string())
        }
        None => (ControllerConfig::default(), "<command line>".to_string()),
    };

    apply_overrides(&mut config, args);
    Ok(config::resolve(config, &origin)?)
}

fn apply_overrides(config: &mut ControllerConfig, args: &RunArgs) {
    if let Some(phase) = args.initial_phase {
        config.initial_phase = phase;
    }
    if let Some(ref min) = args.min_cycle {
        config.cycle.min = Some(min.clone());
    }
    if let Some(ref max) = args.max_cycle {
        config.cycle.max = Some(max.clone());
    }
    if let Some(ref poll) = args.poll {
        config.cycle.poll = Some(poll.clone());
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
}

/// Waits for the transition limit or cancellation; returns the stop reason.
async fn watch(
    controller: &PhaseController,
    limit: Option<u64>,
    cancel: &CancellationToken,
) -> &'static str {
    let mut interval = tokio::time::interval(WATCH_INTERVAL);
    loop {
        tokio::select! {
            () = cancel.cancelled() => return "interrupted",
            _ = interval.tick() => {
                if limit.is_some_and(|n| controller.transition_count() >= n) {
                    return "transition limit reached";
                }
            }
        }
    }
}

/// Observer loop run on a blocking thread; returns how often it was released.
fn observe(index: usize, controller: &PhaseController, target: Phase, events: &EventEmitter) -> u64 {
    let mut releases = 0;
    loop {
        match controller.wait_for_phase(target) {
            Ok(()) => {
                releases += 1;
                tracing::info!(observer = index, phase = %target, "observer released");
                metrics::record_observer_release(target);
                events.emit(Event::ObserverReleased {
                    timestamp: Utc::now(),
                    observer: index,
                    phase: target,
                });
            }
            Err(e) => {
                tracing::debug!(observer = index, error = %e, "observer stopping");
                return releases;
            }
        }
    }
}
