//! Thread handoff primitives
//!
//! - [`HandoffChannel`]: single-slot, latest-wins channel coordinating one
//!   producer thread with any number of blocked receivers

pub mod handoff;

pub use handoff::HandoffChannel;
