use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stagewalk",
    about = "Run and inspect stagewalk stages without a browser",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Simulate a stage headless and print what happened
    Run {
        /// Built-in stage name or path to a stage TOML file
        stage: String,
        /// Simulated seconds to run
        #[arg(long, default_value_t = 10.0)]
        seconds: f32,
        /// Frames per simulated second
        #[arg(long, default_value_t = 60.0)]
        fps: f32,
        /// Walk forward for the whole run with the pointer locked
        #[arg(long)]
        walk: bool,
        /// Session config file (defaults to .stagewalk/config.toml found upward)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the RNG seed
        #[arg(long)]
        seed: Option<u64>,
        /// Also write the report as TOML to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Parse and validate stage TOML files
    Check {
        /// Stage files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print a stage as TOML
    Dump {
        /// Built-in stage name or path to a stage TOML file
        stage: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List built-in stages
    List,
}
