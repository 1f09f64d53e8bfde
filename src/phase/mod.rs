//! Two-phase controller
//!
//! A controller alternates between [`Phase::Red`] and [`Phase::Green`] on a
//! randomized interval and publishes each flip through a latest-wins
//! [`HandoffChannel`](crate::channel::HandoffChannel).
//!
//! # Architecture
//!
//! - [`PhaseState`]: Lock-free atomic state (current phase, transition count, timing)
//! - [`PhaseController`]: Owns the state, the channel, and the cycling thread
//! - [`CycleTiming`]: Interval range, poll quantum, and seed
//! - [`timing`]: Duration parsing and interval draws

pub mod controller;
pub mod state;
pub mod timing;

pub use controller::PhaseController;
pub use state::{Phase, PhaseState, PhaseTransition};
pub use timing::CycleTiming;
