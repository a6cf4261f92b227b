//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CARLA RSS - tick-synchronized RSS safety checks
#[derive(Parser, Debug)]
#[command(
    name = "carla-rss",
    author,
    version,
    about = "Tick-synchronized RSS safety sensor",
    long_about = "Runs an RSS safety sensor attached to an ego vehicle.\n\n\
                  Builds a simulated world from configuration, evaluates the RSS \n\
                  check on every world tick without blocking the tick thread, and \n\
                  publishes the responses to the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CARLA_RSS_VERBOSE")]
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
        env = "CARLA_RSS_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the RSS sensor against the simulated world
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "rss.toml", env = "CARLA_RSS_CONFIG")]
    pub config: PathBuf,

    /// Override the actor the sensor is attached to
    #[arg(long, env = "CARLA_RSS_PARENT_ACTOR")]
    pub parent_actor: Option<u32>,

    /// Override the tick interval from configuration (milliseconds)
    #[arg(long, env = "CARLA_RSS_TICK_INTERVAL_MS")]
    pub tick_interval_ms: Option<u64>,

    /// Override the behaviour for ticks arriving during a check
    #[arg(long, value_enum, env = "CARLA_RSS_SKIP_POLICY")]
    pub skip_policy: Option<SkipPolicyArg>,

    /// Number of world ticks to run (0 = unlimited)
    #[arg(long, default_value = "0", env = "CARLA_RSS_MAX_TICKS")]
    pub max_ticks: u64,

    /// Session timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "CARLA_RSS_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CARLA_RSS_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "rss.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "rss.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the simulated actors
    #[arg(long)]
    pub actors: bool,

    /// Show the dynamics profiles
    #[arg(long)]
    pub dynamics: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
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

/// Skip policy as accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipPolicyArg {
    /// Emit an unsuccessful default response for the skipped tick
    EmitDefault,
    /// Emit nothing for the skipped tick
    Suppress,
}

impl From<SkipPolicyArg> for contracts::SkipPolicy {
    fn from(policy: SkipPolicyArg) -> Self {
        match policy {
            SkipPolicyArg::EmitDefault => Self::EmitDefault,
            SkipPolicyArg::Suppress => Self::Suppress,
        }
    }
}
