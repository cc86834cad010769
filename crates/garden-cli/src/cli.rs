use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages (default for verbose)
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// JSON for programmatic consumption
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "garden")]
#[command(about = "garden - build a hyperlinked note graph from a directory of markdown notes")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses RUST_LOG, then the config file value
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ./garden.toml when present)
    #[arg(short = 'C', long, global = true, env = "GARDEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Content root (overrides config file)
    #[arg(long, global = true)]
    pub content: Option<PathBuf>,

    /// Output directory (overrides config file)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<PathBuf>,

    /// Fail the build when two files map to the same URL
    #[arg(long, global = true)]
    pub strict: bool,

    /// Skip edit-history lookups; every note gets the default history
    #[arg(long = "no-history", global = true)]
    pub no_history: bool,

    /// Number of notes parsed concurrently (overrides config file)
    #[arg(short = 'j', long = "parallel", global = true)]
    pub parallel: Option<usize>,

    /// Set output format
    #[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl Cli {
    /// Level requested on the command line, if any
    pub fn requested_level(&self) -> Option<LevelFilter> {
        match (self.log_level, self.verbose) {
            (Some(level), _) => Some(level.into()),
            (None, true) => Some(LevelFilter::DEBUG),
            (None, false) => None,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Build the note graph and write graph.json to the output directory
    Build,

    /// Report orphaned notes, broken links and the most linked notes
    Links {
        /// Number of most linked notes to show
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,
    },

    /// Display garden statistics
    Stats,

    /// Check external HTTP(S) links found in note bodies
    External {
        #[command(flatten)]
        check: LinkCheckArgs,
    },

    /// Run stats, links and external in one go over a single build
    All {
        /// Number of most linked notes to show
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,

        #[command(flatten)]
        check: LinkCheckArgs,
    },
}

/// Politeness settings for external link checks
#[derive(Args, Debug, Clone, Copy, PartialEq)]
pub struct LinkCheckArgs {
    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "10")]
    pub timeout: u64,

    /// Delay between requests in seconds
    #[arg(short = 'd', long, default_value = "0.5")]
    pub delay: f64,
}
