//! # Application
//!
//! Root command, global options and dispatch to device groups.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use devgroup_core::{DeviceCatalog, DispatchError, Echo, GlobalContext, OutputStrategy};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::config::{CliConfig, OutputMode};

/// Build the root command with one subcommand per device group
pub fn build_cli(catalog: &DeviceCatalog) -> Command {
    Command::new("devgroup")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Control devices from the command line")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::Count)
                .help("Increase log verbosity, repeat for more"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_parser(clap::value_parser!(OutputMode))
                .help("Result format [default: default]"),
        )
        .subcommands(catalog.clap_commands())
}

/// Global options after applying command-line flags over configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub debug: u8,
    pub output: OutputMode,
    pub log: Option<String>,
}

impl Settings {
    pub fn resolve(config: CliConfig, matches: &ArgMatches) -> Self {
        let debug = match matches.get_count("debug") {
            0 => config.debug,
            n => n,
        };
        let output = matches
            .get_one::<OutputMode>("output")
            .copied()
            .unwrap_or(config.output);
        Self {
            debug,
            output,
            log: config.log,
        }
    }

    /// Log filter: `RUST_LOG`, then the configured directive, then `--debug`
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .ok()
            .or_else(|| {
                self.log
                    .as_deref()
                    .and_then(|directive| EnvFilter::try_new(directive).ok())
            })
            .unwrap_or_else(|| EnvFilter::new(level_for(self.debug)))
    }

    pub fn context(&self) -> GlobalContext {
        let ctx = GlobalContext::new(self.debug);
        match self.output {
            OutputMode::Default => ctx,
            OutputMode::Json => ctx.with_output(OutputStrategy::json(false)),
            OutputMode::JsonPretty => ctx.with_output(OutputStrategy::json(true)),
        }
    }
}

fn level_for(debug: u8) -> &'static str {
    match debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize tracing. Logs go to stderr so results on stdout stay parseable.
pub fn init_tracing(settings: &Settings) {
    tracing_subscriber::fmt()
        .with_env_filter(settings.env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Run the device command selected in `matches`
pub fn run(catalog: &DeviceCatalog, matches: &ArgMatches, settings: &Settings) -> Result<()> {
    let (group_name, group_matches) = matches
        .subcommand()
        .context("No device group given")?;
    let group = catalog
        .get(group_name)
        .ok_or_else(|| DispatchError::unknown_command(group_name))?;

    let ctx = settings.context();
    debug!(group = group_name, ?settings, "Dispatching");
    let command = group_matches.subcommand_name().unwrap_or_default();
    group
        .dispatch(&ctx, group_matches, Echo::stdout())
        .with_context(|| format!("Command '{} {}' failed", group_name, command))?;

    info!("Command completed successfully");
    Ok(())
}

/// Commands valid at the position named by `matches`, for error suggestions
pub fn valid_commands<'a>(catalog: &'a DeviceCatalog, matches: &ArgMatches) -> Vec<&'a str> {
    match matches.subcommand_name().and_then(|name| catalog.get(name)) {
        Some(group) => group.list_commands(),
        None => catalog.names(),
    }
}
