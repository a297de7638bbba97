//! Shardscope CLI - Cross-shard subject listings
//!
//! A command-line interface for listing subjects across independent shards
//! under hierarchical access rules, and for inspecting the shard directory.
//!
//! # Usage
//!
//! ```bash
//! # List the first page as a pure administrator
//! shardscope subjects --actor root --actor-shard north --admin
//!
//! # List what a manager may see, filtered by KYC status
//! shardscope subjects --actor m-17 --actor-shard north --admin --manager --kyc verified
//!
//! # Show the resolved accessible set
//! shardscope resolve --actor a-1 --actor-shard north --admin --superior
//!
//! # Probe every shard
//! shardscope shards check
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use shardscope_config::{
    ConfigError, ConfigOverrides, HierarchyFallback, LogFormat, LoggingConfig,
};
use tracing_subscriber::EnvFilter;

mod commands;

/// Shardscope - Hierarchical access and cross-shard pagination
#[derive(Parser, Debug)]
#[command(name = "shardscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Path to configuration file (bypasses global/local lookup)
    #[arg(long, short = 'c', global = true, env = "SHARDSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Per-shard call timeout in milliseconds
    #[arg(long, global = true, env = "SHARDSCOPE_SHARD_TIMEOUT_MS")]
    shard_timeout_ms: Option<u64>,

    /// Log level or filter directive (e.g. "info", "shardscope_access=debug")
    #[arg(long, global = true, env = "SHARDSCOPE_LOG")]
    log_level: Option<String>,

    /// Behaviour when the delegation graph is unreadable (degrade, fail)
    #[arg(long, global = true, env = "SHARDSCOPE_HIERARCHY_FALLBACK", value_parser = parse_fallback)]
    hierarchy_fallback: Option<HierarchyFallback>,
}

/// Parse hierarchy fallback from string
fn parse_fallback(s: &str) -> Result<HierarchyFallback, String> {
    s.parse().map_err(|e: ConfigError| e.to_string())
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            shard_timeout_ms: self.shard_timeout_ms,
            hierarchy_fallback: self.hierarchy_fallback,
            log_level: self.log_level.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List one page of subjects across shards
    Subjects(commands::subjects::SubjectsArgs),

    /// Show the subjects an actor may see in their own shard
    Resolve(commands::resolve::ResolveArgs),

    /// Shard directory commands
    #[command(subcommand)]
    Shards(commands::shards::ShardsCommand),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

/// Install the stderr subscriber.
///
/// `--quiet` and `--verbose` win over the configured level.
fn init_logging(global: &GlobalOptions, logging: &LoggingConfig) -> Result<()> {
    let directive = if global.quiet {
        "error".to_string()
    } else if global.verbose {
        "debug".to_string()
    } else {
        logging.level.clone()
    };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_ansi(true).try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config is reported by the command itself
    let logging = commands::load_config(&cli.global)
        .map(|c| c.logging)
        .unwrap_or_default();
    init_logging(&cli.global, &logging)?;

    match cli.command {
        Commands::Subjects(args) => commands::subjects::execute(args, cli.global).await,
        Commands::Resolve(args) => commands::resolve::execute(args, cli.global).await,
        Commands::Shards(cmd) => commands::shards::execute(cmd, cli.global).await,
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global).await,
    }
}
