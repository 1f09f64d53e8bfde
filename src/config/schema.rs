//! Configuration schema
//!
//! Serde types for `phaselight` YAML configuration files:
//!
//! ```yaml
//! initial_phase: red
//! cycle:
//!   min: 4000ms
//!   max: 6000ms
//!   poll: 1ms
//! seed: 42
//! ```

use serde::{Deserialize, Serialize};

use crate::phase::Phase;

/// Top-level controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Phase the controller starts in (defaults to red)
    #[serde(default)]
    pub initial_phase: Phase,

    /// Interval range and poll quantum
    #[serde(default)]
    pub cycle: CycleConfig,

    /// Seed for reproducible interval draws
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Cycle timing section; durations are human-readable strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CycleConfig {
    /// Lower bound of a phase duration (e.g. `"4000ms"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,

    /// Upper bound of a phase duration (e.g. `"6s"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,

    /// Sleep between elapsed-time checks (e.g. `"1ms"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<String>,
}
