//! Command-line interface for voxchat
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Hands-free voice chat in the terminal
#[derive(Parser, Debug)]
#[command(
    name = "voxchat",
    version,
    about = "Hands-free voice chat in the terminal"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: level meter during recording)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio input device (e.g., hw:0)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Chat backend base URL (default: http://localhost:5000)
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// RMS speech threshold (0.0 to 1.0)
    #[arg(long, value_name = "LEVEL")]
    pub threshold: Option<f32>,

    /// Trailing silence before a recording auto-stops, in milliseconds
    #[arg(long, value_name = "MS")]
    pub silence: Option<u32>,

    /// Grace period to start speaking before the turn is abandoned, in milliseconds
    #[arg(long, value_name = "MS")]
    pub grace: Option<u32>,

    /// Exit after the first turn instead of re-arming
    #[arg(long)]
    pub once: bool,

    /// Disable automatic re-arming between turns; press Enter for each turn
    #[arg(long)]
    pub no_auto: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
