//! # devgroup
//!
//! Control devices from the command line.

use devgroup_cli::cli::{
    build_cli, init_tracing, print_error, run, valid_commands, ConfigLoader, ErrorReport,
    Settings,
};
use devgroup_cli::devices;
use tracing::{error, info};

fn main() {
    let catalog = match devices::catalog() {
        Ok(catalog) => catalog,
        Err(err) => fail(&anyhow::Error::new(err), &[]),
    };

    // Usage errors exit through clap with its own code
    let matches = build_cli(&catalog).get_matches();

    let config = match ConfigLoader::new().load() {
        Ok(config) => config,
        Err(err) => fail(&anyhow::Error::new(err), &[]),
    };
    let settings = Settings::resolve(config, &matches);
    init_tracing(&settings);

    info!("Running command: {:?}", matches.subcommand_name());

    if let Err(err) = run(&catalog, &matches, &settings) {
        error!("Command failed: {:#}", err);
        fail(&err, &valid_commands(&catalog, &matches));
    }
}

fn fail(err: &anyhow::Error, commands: &[&str]) -> ! {
    let report = ErrorReport::from_error(err, commands);
    print_error(&report);
    std::process::exit(report.exit_code);
}
