//! Command-line interface
//!
//! Argument definitions and command handlers for the `phaselight` binary.

pub mod args;
pub mod commands;
