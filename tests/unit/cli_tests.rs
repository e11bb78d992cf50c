//! Unit tests for CLI argument parsing

use clap::Parser;
use std::path::PathBuf;
use syncdiff::cli::{Cli, Commands, GenerateCommands};

#[test]
fn test_cli_run_command() {
    let cli = Cli::try_parse_from(["syncdiff", "run", "--config", "task.toml"]).unwrap();
    match cli.command {
        Commands::Run { config } => assert_eq!(config, PathBuf::from("task.toml")),
        _ => panic!("Expected Run command"),
    }
    assert!(!cli.verbose);
}

#[test]
fn test_cli_verbose_is_global() {
    let cli = Cli::try_parse_from(["syncdiff", "run", "-c", "task.toml", "--verbose"]).unwrap();
    assert!(cli.verbose);
}

#[test]
fn test_cli_template_with_output() {
    let cli = Cli::try_parse_from([
        "syncdiff",
        "generate-config",
        "template",
        "-o",
        "conf/custom.toml",
    ])
    .unwrap();
    match cli.command {
        Commands::GenerateConfig {
            command: GenerateCommands::Template { output },
        } => assert_eq!(output, PathBuf::from("conf/custom.toml")),
        _ => panic!("Expected GenerateConfig command"),
    }
}

#[test]
fn test_cli_rejects_unknown_command() {
    assert!(Cli::try_parse_from(["syncdiff", "compare"]).is_err());
}
