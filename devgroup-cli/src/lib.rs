//! # devgroup-cli
//!
//! Command-line front-end: one subcommand per device group, one
//! sub-subcommand per device command.

pub mod cli;
pub mod devices;
