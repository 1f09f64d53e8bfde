//! Phase state representation
//!
//! Lock-free atomic state for the current phase, transition count, and the
//! instant the current phase was entered. Written by the cycling thread and
//! read from any thread.

use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::ControllerError;

/// One of the two phases a controller alternates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Stop phase; every controller starts here unless configured otherwise.
    #[default]
    Red,
    /// Go phase.
    Green,
}

impl Phase {
    /// Returns the other phase.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Red,
        }
    }

    /// Returns the lowercase name used in logs, events, and config files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
        }
    }

    const fn to_u8(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Green => 1,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            other => Err(ControllerError::InvalidArgument(format!(
                "unknown phase '{other}' (expected red or green)"
            ))),
        }
    }
}

impl TryFrom<u8> for Phase {
    type Error = ControllerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Red),
            1 => Ok(Self::Green),
            other => Err(ControllerError::InvalidArgument(format!(
                "phase value {other} out of range (expected 0 or 1)"
            ))),
        }
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> Self {
        phase.to_u8()
    }
}

/// Record of a single phase flip, produced by the cycling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Phase we left
    pub from: Phase,
    /// Phase we entered
    pub to: Phase,
    /// Randomly drawn duration the previous phase was scheduled for
    pub target: Duration,
    /// Measured time actually spent in the previous phase
    pub elapsed: Duration,
    /// 1-based transition number since cycling started
    pub sequence: u64,
}

impl PhaseTransition {
    /// Measured time in the previous phase, in whole milliseconds.
    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        super::timing::whole_millis(self.elapsed)
    }

    /// Scheduled duration of the previous phase, in whole milliseconds.
    #[must_use]
    pub const fn target_ms(&self) -> u64 {
        super::timing::whole_millis(self.target)
    }
}

/// Atomic phase state shared between the cycling thread and readers.
pub struct PhaseState {
    /// Current phase encoded as `u8`
    current_phase: AtomicU8,
    /// Number of completed transitions
    transitions: AtomicU64,
    /// Timestamp when the current phase was entered
    phase_entered_at: Mutex<Instant>,
}

impl PhaseState {
    /// Creates a new state starting in `initial`.
    #[must_use]
    pub fn new(initial: Phase) -> Self {
        Self {
            current_phase: AtomicU8::new(initial.to_u8()),
            transitions: AtomicU64::new(0),
            phase_entered_at: Mutex::new(Instant::now()),
        }
    }

    /// Returns the latest committed phase.
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        match self.current_phase.load(Ordering::SeqCst) {
            0 => Phase::Red,
            _ => Phase::Green,
        }
    }

    /// Returns the number of transitions committed so far.
    #[must_use]
    pub fn transition_count(&self) -> u64 {
        self.transitions.load(Ordering::SeqCst)
    }

    /// Returns the instant the current phase was entered.
    #[must_use]
    pub fn phase_entered_at(&self) -> Instant {
        *self
            .phase_entered_at
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Flips the phase, resets the entry timestamp, and bumps the counter.
    ///
    /// Returns `(from, to, sequence)`. Only the cycling thread calls this.
    pub(crate) fn toggle(&self) -> (Phase, Phase, u64) {
        let from = self.current_phase();
        let to = from.toggled();
        *self
            .phase_entered_at
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Instant::now();
        self.current_phase.store(to.to_u8(), Ordering::SeqCst);
        let sequence = self.transitions.fetch_add(1, Ordering::SeqCst) + 1;
        (from, to, sequence)
    }
}

impl std::fmt::Debug for PhaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseState")
            .field("current_phase", &self.current_phase())
            .field("transitions", &self.transition_count())
            .finish_non_exhaustive()
    }
}
