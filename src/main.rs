//! Main entry point for syncdiff CLI

use clap::Parser;
use syncdiff::cli::Cli;
use syncdiff::commands::execute_command;

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so they never land inside the repainted region
    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level())
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = execute_command(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
