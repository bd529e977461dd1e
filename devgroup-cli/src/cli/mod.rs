//! # CLI Module
//!
//! Root command, configuration and error reporting.

pub mod app;
pub mod config;
pub mod error;

pub use app::{build_cli, init_tracing, run, valid_commands, Settings};
pub use config::{CliConfig, ConfigError, ConfigLoader, OutputMode};
pub use error::{format_error, print_error, ErrorReport};
