//! macbundle CLI - build helpers for macOS application bundles

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("macbundle=debug")
    } else {
        EnvFilter::new("macbundle=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Stub(args) => commands::stub::execute(args),
        Commands::Convert(args) => commands::convert::execute(args, cli.verbose),
        Commands::Verify(args) => commands::verify::execute(args, cli.verbose),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
