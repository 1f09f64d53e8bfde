//! Shared integration-test harness for running the `phaselight` binary and
//! capturing controller events in memory.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use phaselight::phase::CycleTiming;
use serde_json::Value;

/// Helpers for invoking the compiled `phaselight` binary.
pub struct PhaseLightProcess;

impl PhaseLightProcess {
    /// Runs `phaselight` with `args` to completion and returns its output.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_command(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_phaselight"))
            .args(args)
            .env_remove("PHASELIGHT_CONFIG")
            .env_remove("PHASELIGHT_LOG_LEVEL")
            .output()
            .expect("failed to spawn phaselight")
    }

    /// Absolute path to a file under `tests/fixtures`.
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    /// Reads a JSONL events file into parsed values.
    #[allow(clippy::missing_panics_doc)]
    pub fn read_events(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .expect("events file should exist")
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("event line should be JSON"))
            .collect()
    }
}

/// A cloneable in-memory writer for capturing emitted events.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Parses everything written so far as JSONL.
    #[allow(clippy::missing_panics_doc)]
    pub fn events(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Fast, seeded timing so controller tests finish in milliseconds.
#[allow(clippy::missing_panics_doc)]
pub fn fast_timing(min_ms: u64, max_ms: u64) -> CycleTiming {
    CycleTiming::new(
        Duration::from_millis(min_ms),
        Duration::from_millis(max_ms),
        Duration::from_millis(1),
    )
    .unwrap()
    .with_seed(42)
}
