//! Command-line interface for syncdiff

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "syncdiff")]
#[command(about = "Compare tables in batch with live terminal progress")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Log level selected by the `--verbose` flag
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the comparison task described by a config file
    Run {
        /// Config file for the comparison task
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Config file generator
    GenerateConfig {
        #[command(subcommand)]
        command: GenerateCommands,
    },
}

#[derive(Subcommand)]
pub enum GenerateCommands {
    /// Write a config file template
    Template {
        /// Path of the generated template
        #[arg(short, long, default_value = "sync-diff-template.toml")]
        output: PathBuf,
    },
}
