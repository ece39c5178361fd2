//! CLI argument parsing using clap

use clap::{Parser, Subcommand};

/// satring - always-full audio ring with snapshot reads
///
/// Streams synthetic capture frames through the ring and reports the
/// snapshots a delay-analysis consumer would see
#[derive(Parser, Debug)]
#[command(name = "satring")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbose output (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output to file
    #[arg(long, global = true)]
    pub log: Option<String>,

    /// Configuration file (default: satring.toml next to the executable,
    /// then the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show ring geometry for the effective configuration
    Info,

    /// Stream a frame ramp through the ring and check each snapshot
    Run {
        /// How long to run, in seconds
        #[arg(short, long, default_value = "5")]
        seconds: u64,

        /// Override the analysis window length in milliseconds
        #[arg(short, long)]
        window_ms: Option<u32>,
    },

    /// Print a commented sample configuration file
    SampleConfig {
        /// Write the effective configuration to this path instead
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Args {
    /// Get the log level based on verbose/quiet flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else {
            match self.verbose {
                0 => tracing::Level::INFO,
                1 => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            }
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Command::Run {
            seconds: 5,
            window_ms: None,
        }
    }
}
