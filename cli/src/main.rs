mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{crosswalk, overlay};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match &cli.command {
        Commands::Overlay(args) => overlay::run(&cli, args),
        Commands::Crosswalk(args) => crosswalk::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
