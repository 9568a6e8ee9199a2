//! Skipper CLI - drive a local governance ledger from the command line.
//!
//! The ledger lives in a JSON snapshot between invocations; each command
//! is one or more top-level sends against it.

mod commands;
mod config;
mod output;
mod telemetry;

use clap::Parser;

fn main() {
    let cli = commands::Cli::parse();

    if let Err(e) = run(cli) {
        output::print_error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: commands::Cli) -> anyhow::Result<()> {
    let mut config = config::CliConfig::load_or_default(&cli.config)?;
    if let Some(state) = cli.state {
        config.state_file = state;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json_logs;
    config.validate()?;

    telemetry::init_telemetry(&config.logging.level, config.logging.json)?;

    commands::execute(cli.command, &config, &cli.config)
}
