//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::ChannelId;
use std::path::PathBuf;

/// Relay - forwards channel messages and reassembles albums
#[derive(Parser, Debug)]
#[command(
    name = "relay",
    author,
    version,
    about = "Channel relay with album reassembly",
    long_about = "Forwards messages from source channels to their mapped destinations.\n\n\
                  Album items are buffered until the album is complete and forwarded \n\
                  as one unit; rate-limit signals are waited out and retried once."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Manage source -> destination mappings
    Map(MapArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "relay.toml", env = "RELAY_CONFIG")]
    pub config: PathBuf,

    /// Recorded JSONL event feed to replay
    #[arg(short, long, env = "RELAY_EVENTS")]
    pub events: Option<PathBuf>,

    /// Replay speed multiplier (2.0 = twice as fast)
    #[arg(long, default_value = "1.0", env = "RELAY_SPEED")]
    pub speed: f64,

    /// Override the album quiescence window (milliseconds)
    #[arg(long, env = "RELAY_WINDOW_MS")]
    pub window_ms: Option<u64>,

    /// Override the mapping file path
    #[arg(long, env = "RELAY_MAPPING_FILE")]
    pub mapping_file: Option<PathBuf>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "RELAY_METRICS_PORT")]
    pub metrics_port: u16,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "RELAY_TIMEOUT")]
    pub timeout: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml", env = "RELAY_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml", env = "RELAY_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the routes currently in the mapping file
    #[arg(long)]
    pub routes: bool,
}

/// Arguments for the `map` command group
#[derive(Args, Debug)]
pub struct MapArgs {
    #[command(subcommand)]
    pub command: MapCommand,
}

/// Mapping administration
#[derive(Subcommand, Debug)]
pub enum MapCommand {
    /// Add or replace the destination of a source channel
    Set(MapSetArgs),

    /// List the stored mappings
    Show(MapShowArgs),
}

/// Where the mapping file lives
#[derive(Args, Debug, Clone)]
pub struct MappingLocation {
    /// Mapping file path (takes precedence over the configuration file)
    #[arg(long, env = "RELAY_MAPPING_FILE")]
    pub mapping_file: Option<PathBuf>,

    /// Configuration file naming the mapping file
    #[arg(short, long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for `map set`
#[derive(Args, Debug)]
#[command(allow_negative_numbers = true)]
pub struct MapSetArgs {
    /// Source channel id
    pub source: ChannelId,

    /// Destination channel id
    pub destination: ChannelId,

    #[command(flatten)]
    pub location: MappingLocation,
}

/// Arguments for `map show`
#[derive(Args, Debug)]
pub struct MapShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub location: MappingLocation,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
