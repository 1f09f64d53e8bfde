//! Observability module
//!
//! Logging, metrics, and structured event infrastructure for watching a
//! controller cycle.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{Event, EventEmitter};
pub use logging::{LogFormat, LogSettings, init_logging};
pub use metrics::init_metrics;
