//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// stylecheck - Check remotely hosted styles for updates
#[derive(Parser, Debug)]
#[command(name = "stylecheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (TOML, JSON or YAML); defaults to stylecheck.* in the current directory
    #[arg(long, global = true, env = "STYLECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Check styles for updates
    ///
    /// Examples:
    ///   stylecheck check               # Check every style with an update URL
    ///   stylecheck check --id 12       # Check one style
    ///   stylecheck check --dry-run     # Report updates without saving
    Check {
        /// Only check the style with this id
        #[arg(long)]
        id: Option<u64>,

        /// Report what would change without saving anything
        #[arg(long)]
        dry_run: bool,

        /// Check even styles that look locally edited
        #[arg(long)]
        force: bool,
    },

    /// Print the update activity log
    Log {
        /// Only print the last N lines
        #[arg(long)]
        tail: Option<usize>,
    },

    /// Run scheduled checks until interrupted
    Watch,
}
