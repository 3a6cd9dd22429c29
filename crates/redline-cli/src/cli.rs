//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Redline - extract what an amendment changes in a contract.
#[derive(Debug, Parser)]
#[command(name = "redline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Settings file (TOML); environment variables still override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use the mock parser and stub agents (no API key needed)
    #[arg(long, global = true)]
    pub mock: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compare an original contract with its amendment and extract changes
    Compare(CompareArgs),

    /// Validate a JSON file against the change-result schema
    Validate(ValidateArgs),
}

/// Arguments for the compare command.
#[derive(Debug, Parser)]
pub struct CompareArgs {
    /// Path or URL of the original contract image
    pub original: String,

    /// Path or URL of the amendment image
    pub amendment: String,

    /// Contract ID for tracking
    #[arg(long = "id")]
    pub contract_id: Option<String>,

    /// Write the result JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print JSON on a single line
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for the validate command.
#[derive(Debug, Parser)]
pub struct ValidateArgs {
    /// JSON file to validate
    pub json_file: PathBuf,
}
