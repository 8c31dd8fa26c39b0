//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// UniBus - in-process domain-event dispatch
#[derive(Parser, Debug)]
#[command(name = "ub", author, version, about = "In-process domain-event dispatch for university modules")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List handler registrations in invocation order
    Handlers {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a faculty and users through the platform and report counters
    Simulate {
        /// Faculty name
        #[arg(long, default_value = "Engineering")]
        faculty: String,

        /// Students to enroll in the faculty
        #[arg(short, long, default_value = "3")]
        students: usize,

        /// Professors to add to the faculty
        #[arg(short, long, default_value = "1")]
        professors: usize,

        /// Admin accounts (no faculty)
        #[arg(short, long, default_value = "1")]
        admins: usize,

        /// Students referencing a faculty that does not exist
        #[arg(long, default_value = "0")]
        orphans: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// Output format for report commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format '{}', expected text or json", s)),
        }
    }
}
