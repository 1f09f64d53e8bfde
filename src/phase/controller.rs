//! Phase controller orchestration
//!
//! The `PhaseController` owns the current phase and a background thread that
//! flips it on a randomized interval, publishing every flip through a
//! [`HandoffChannel`]. Consumers block in [`PhaseController::wait_for_phase`]
//! until the phase they care about is delivered.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::HandoffChannel;
use crate::error::{ChannelError, ControllerError};
use crate::observability::events::{Event, EventEmitter};
use crate::observability::metrics;

use super::state::{Phase, PhaseState, PhaseTransition};
use super::timing::{CycleTiming, whole_millis};

/// Name given to the background cycling thread.
pub const CYCLE_THREAD_NAME: &str = "phase-cycle";

/// Two-phase controller with a randomized cycling thread.
///
/// The cycling thread is the only writer of the current phase and the only
/// producer into the channel. Readers call [`current_phase`](Self::current_phase)
/// from any thread.
///
/// Dropping the controller shuts the thread down and closes the channel.
pub struct PhaseController {
    /// Atomic phase state shared with the cycling thread
    state: Arc<PhaseState>,
    /// Latest-wins channel carrying every new phase
    channel: Arc<HandoffChannel<Phase>>,
    /// Interval range, poll quantum, and seed
    timing: CycleTiming,
    /// Phase the controller was constructed with
    initial: Phase,
    /// Stops the cycling loop between poll quanta
    cancel: CancellationToken,
    /// Handle of the cycling thread once started
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Optional JSONL event sink
    events: Option<Arc<EventEmitter>>,
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseController {
    /// Creates a controller in [`Phase::Red`] with the default 4–6 s interval.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timing(Phase::Red, CycleTiming::default())
    }

    /// Creates a controller with an explicit initial phase and timing.
    #[must_use]
    pub fn with_timing(initial: Phase, timing: CycleTiming) -> Self {
        Self {
            state: Arc::new(PhaseState::new(initial)),
            channel: Arc::new(HandoffChannel::new()),
            timing,
            initial,
            cancel: CancellationToken::new(),
            worker: Mutex::new(None),
            events: None,
        }
    }

    /// Attaches an event emitter receiving cycling and transition events.
    #[must_use]
    pub fn with_event_emitter(mut self, events: Arc<EventEmitter>) -> Self {
        self.events = Some(events);
        self
    }

    /// Returns the latest committed phase.
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.state.current_phase()
    }

    /// Returns the number of transitions since cycling started.
    #[must_use]
    pub fn transition_count(&self) -> u64 {
        self.state.transition_count()
    }

    /// Returns the instant the current phase was entered.
    #[must_use]
    pub fn phase_entered_at(&self) -> Instant {
        self.state.phase_entered_at()
    }

    /// Returns the timing this controller cycles with.
    #[must_use]
    pub const fn timing(&self) -> &CycleTiming {
        &self.timing
    }

    /// Returns a handle to the transition channel for direct receiving.
    ///
    /// Every receiver competes for the same single slot: one send feeds one
    /// receiver.
    #[must_use]
    pub fn channel(&self) -> Arc<HandoffChannel<Phase>> {
        Arc::clone(&self.channel)
    }

    /// Returns `true` while the cycling thread is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Spawns the cycling thread and returns immediately.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::AlreadyStarted`] if called more than once.
    /// - [`ControllerError::ResourceExhausted`] if the OS refuses a new thread.
    /// - [`ControllerError::Channel`] if the controller was already shut down.
    pub fn start_cycling(&self) -> Result<(), ControllerError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            return Err(ControllerError::AlreadyStarted);
        }
        if self.cancel.is_cancelled() {
            return Err(ControllerError::Channel(ChannelError::Closed));
        }

        let cycle = CycleLoop {
            state: Arc::clone(&self.state),
            channel: Arc::clone(&self.channel),
            timing: self.timing,
            cancel: self.cancel.clone(),
            events: self.events.clone(),
        };

        let handle = thread::Builder::new()
            .name(CYCLE_THREAD_NAME.to_string())
            .spawn(move || cycle.run())
            .map_err(|e| ControllerError::ResourceExhausted(e.to_string()))?;

        debug!(
            initial = %self.initial,
            min_ms = whole_millis(self.timing.min()),
            max_ms = whole_millis(self.timing.max()),
            "cycling started"
        );
        *worker = Some(handle);
        Ok(())
    }

    /// Blocks until `target` is delivered through the channel.
    ///
    /// Values other than `target` are discarded. A phase that is already
    /// current does not count; the call waits for the next delivered flip to
    /// `target`. Because the channel is latest-wins and shared, a flip taken
    /// by another waiter is not seen here.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Channel`] if the controller shuts down
    /// while waiting.
    pub fn wait_for_phase(&self, target: Phase) -> Result<(), ControllerError> {
        debug!(%target, "waiting for phase");
        loop {
            if self.channel.receive()? == target {
                debug!(%target, "phase reached");
                return Ok(());
            }
        }
    }

    /// Like [`wait_for_phase`](Self::wait_for_phase) with an overall deadline.
    ///
    /// Returns `Ok(false)` if `target` was not delivered within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Channel`] if the controller shuts down
    /// while waiting.
    pub fn wait_for_phase_timeout(
        &self,
        target: Phase,
        timeout: Duration,
    ) -> Result<bool, ControllerError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            match self.channel.receive_timeout(remaining)? {
                Some(phase) if phase == target => return Ok(true),
                Some(_) => {}
                None => return Ok(false),
            }
        }
    }

    /// Stops the cycling thread, closes the channel, and joins the thread.
    ///
    /// Blocked waiters are released with a closed-channel error. Calling this
    /// more than once is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::WorkerPanicked`] if the cycling thread
    /// panicked.
    pub fn shutdown(&self) -> Result<(), ControllerError> {
        self.shutdown_with_reason("shutdown")
    }

    /// Like [`shutdown`](Self::shutdown), recording `reason` in the
    /// `CyclingStopped` event.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::WorkerPanicked`] if the cycling thread
    /// panicked.
    pub fn shutdown_with_reason(&self, reason: &str) -> Result<(), ControllerError> {
        self.cancel.cancel();
        self.channel.close();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return Ok(());
        };

        if handle.join().is_err() {
            warn!("cycling thread panicked");
            return Err(ControllerError::WorkerPanicked);
        }

        let transitions = self.transition_count();
        debug!(transitions, reason, "cycling stopped");
        self.emit(Event::CyclingStopped {
            timestamp: Utc::now(),
            reason: reason.to_string(),
            transitions,
        });
        Ok(())
    }

    fn emit(&self, event: Event) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}

impl Drop for PhaseController {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "controller shutdown on drop failed");
        }
    }
}

impl std::fmt::Debug for PhaseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseController")
            .field("current_phase", &self.current_phase())
            .field("transitions", &self.transition_count())
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

/// Everything the cycling thread needs, moved into it at spawn.
struct CycleLoop {
    state: Arc<PhaseState>,
    channel: Arc<HandoffChannel<Phase>>,
    timing: CycleTiming,
    cancel: CancellationToken,
    events: Option<Arc<EventEmitter>>,
}

impl CycleLoop {
    fn run(self) {
        metrics::set_current_phase(self.state.current_phase());
        if let Some(events) = &self.events {
            events.emit(Event::CyclingStarted {
                timestamp: Utc::now(),
                initial_phase: self.state.current_phase(),
                min_cycle_ms: whole_millis(self.timing.min()),
                max_cycle_ms: whole_millis(self.timing.max()),
            });
        }

        let mut rng = self.timing.rng();
        let mut started = Instant::now();
        let mut target = self.timing.draw(&mut rng);

        while !self.cancel.is_cancelled() {
            thread::sleep(self.timing.poll());

            let elapsed = started.elapsed();
            if elapsed <= target {
                continue;
            }

            let transition = self.flip(target, elapsed);
            if self.channel.send(transition.to).is_err() {
                debug!("channel closed, cycling thread exiting");
                break;
            }

            started = Instant::now();
            target = self.timing.draw(&mut rng);
        }
    }

    /// Commits the new phase before it is published, so a waiter released
    /// with `to` always reads `to` back from the state.
    fn flip(&self, target: Duration, elapsed: Duration) -> PhaseTransition {
        let (from, to, sequence) = self.state.toggle();
        let transition = PhaseTransition {
            from,
            to,
            target,
            elapsed,
            sequence,
        };

        info!(
            from = %transition.from,
            to = %transition.to,
            sequence = transition.sequence,
            elapsed_ms = transition.elapsed_ms(),
            target_ms = transition.target_ms(),
            "phase transition"
        );
        metrics::record_transition(&transition);
        if let Some(events) = &self.events {
            events.emit(Event::phase_changed(&transition));
        }

        transition
    }
}
