//! Structured event stream for `phaselight`.
//!
//! Discrete, typed events emitted while a controller cycles. Events are
//! serialized as newline-delimited JSON (JSONL) and include a monotonically
//! increasing sequence number for ordering guarantees.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::phase::{Phase, PhaseTransition};

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during `phaselight` operation.
///
/// Each variant is tagged with `"type"` when serialized to JSON so consumers
/// can dispatch on the event kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The cycling thread has started.
    CyclingStarted {
        /// When cycling started.
        timestamp: DateTime<Utc>,
        /// Phase the controller started in.
        initial_phase: Phase,
        /// Lower bound of a phase duration in milliseconds.
        min_cycle_ms: u64,
        /// Upper bound of a phase duration in milliseconds.
        max_cycle_ms: u64,
    },

    /// The controller flipped to a new phase.
    PhaseChanged {
        /// When the flip happened.
        timestamp: DateTime<Utc>,
        /// Phase that was left.
        from: Phase,
        /// Phase that was entered.
        to: Phase,
        /// 1-based transition number.
        transition: u64,
        /// Measured time spent in the previous phase.
        elapsed_ms: u64,
        /// Scheduled duration of the previous phase.
        target_ms: u64,
    },

    /// A waiting observer received the phase it was waiting for.
    ObserverReleased {
        /// When the observer was released.
        timestamp: DateTime<Utc>,
        /// Zero-based observer index.
        observer: usize,
        /// Phase the observer waited for.
        phase: Phase,
    },

    /// The cycling thread has stopped.
    CyclingStopped {
        /// When cycling stopped.
        timestamp: DateTime<Utc>,
        /// Human-readable stop reason.
        reason: String,
        /// Transitions completed before stopping.
        transitions: u64,
    },
}

impl Event {
    /// Builds a `PhaseChanged` event stamped with the current time.
    #[must_use]
    pub fn phase_changed(transition: &PhaseTransition) -> Self {
        Self::PhaseChanged {
            timestamp: Utc::now(),
            from: transition.from,
            to: transition.to,
            transition: transition.sequence,
            elapsed_ms: transition.elapsed_ms(),
            target_ms: transition.target_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

/// Wraps an [`Event`] with a monotonically increasing sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    /// Zero-based, monotonically increasing sequence counter.
    sequence: u64,
    /// The wrapped event (flattened into the same JSON object).
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Each call to [`emit`](Self::emit) atomically increments the sequence
/// counter, serializes the event as a single JSON line, and flushes the
/// underlying writer. Serialization or I/O failures are silently dropped.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

// Box<dyn Write> is not Debug.
impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that silently discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        // Sequence is assigned under the writer lock so lines stay in order.
        let Ok(mut w) = self.writer.lock() else {
            return;
        };
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(line) = serde_json::to_string(&envelope) {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    /// In-memory writer for capturing emitter output in tests.
    #[derive(Clone)]
    struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn contents(&self) -> String {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn phase_changed() -> Event {
        Event::PhaseChanged {
            timestamp: DateTime::parse_from_rfc3339("2026-03-01T08:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            from: Phase::Red,
            to: Phase::Green,
            transition: 1,
            elapsed_ms: 4512,
            target_ms: 4511,
        }
    }

    #[test]
    fn phase_changed_copies_transition_fields() {
        let transition = PhaseTransition {
            from: Phase::Green,
            to: Phase::Red,
            target: std::time::Duration::from_micros(4_511_900),
            elapsed: std::time::Duration::from_millis(4512),
            sequence: 7,
        };
        let Event::PhaseChanged {
            from,
            to,
            transition,
            elapsed_ms,
            target_ms,
            ..
        } = Event::phase_changed(&transition)
        else {
            panic!("expected PhaseChanged");
        };
        assert_eq!((from, to), (Phase::Green, Phase::Red));
        assert_eq!(transition, 7);
        assert_eq!(elapsed_ms, 4512);
        assert_eq!(target_ms, 4511);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let json = serde_json::to_string(&phase_changed()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "PhaseChanged");
        assert_eq!(parsed["from"], "red");
        assert_eq!(parsed["to"], "green");
    }

    #[test]
    fn emitter_writes_valid_jsonl() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(phase_changed());

        let output = tw.contents();
        let parsed: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(parsed["type"], "PhaseChanged");
        assert_eq!(parsed["transition"], 1);
        assert_eq!(parsed["elapsed_ms"], 4512);
        assert_eq!(parsed["sequence"], 0);
    }

    #[test]
    fn emitter_increments_sequence() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(phase_changed());
        emitter.emit(Event::CyclingStopped {
            timestamp: Utc::now(),
            reason: "shutdown".to_owned(),
            transitions: 1,
        });

        assert_eq!(emitter.event_count(), 2);

        let lines: Vec<serde_json::Value> = tw
            .contents()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[1]["sequence"], 1);
        assert_eq!(lines[1]["reason"], "shutdown");
    }

    #[test]
    fn all_event_variants_serialize_to_valid_json() {
        let now = Utc::now();
        let variants: Vec<Event> = vec![
            Event::CyclingStarted {
                timestamp: now,
                initial_phase: Phase::Red,
                min_cycle_ms: 4000,
                max_cycle_ms: 6000,
            },
            phase_changed(),
            Event::ObserverReleased {
                timestamp: now,
                observer: 3,
                phase: Phase::Green,
            },
            Event::CyclingStopped {
                timestamp: now,
                reason: "transition limit reached".to_owned(),
                transitions: 8,
            },
        ];

        for variant in &variants {
            let json = serde_json::to_string(variant).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert!(parsed.get("type").is_some(), "missing type tag: {json}");
        }
    }

    #[test]
    fn noop_emitter_still_counts() {
        let emitter = EventEmitter::noop();
        emitter.emit(phase_changed());
        assert_eq!(emitter.event_count(), 1);
    }

    #[test]
    fn envelope_flattens_event_fields() {
        let envelope = EventEnvelope {
            sequence: 7,
            event: phase_changed(),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["sequence"], 7);
        assert_eq!(parsed["type"], "PhaseChanged");
        assert!(
            parsed.get("event").is_none(),
            "event field should be flattened"
        );
    }
}
