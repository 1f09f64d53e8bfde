//! `phaselight` - two-phase timed controller
//!
//! A [`PhaseController`](phase::PhaseController) alternates between two
//! phases on a background thread and announces each change through a
//! single-slot, latest-wins [`HandoffChannel`](channel::HandoffChannel).
//! Observers block on the channel until the phase they care about arrives.

pub mod channel;
pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod phase;
