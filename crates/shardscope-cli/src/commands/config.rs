//! Config command - View and manage configuration
//!
//! - Show the effective configuration
//! - Get or set individual values (local or global)
//! - Show configuration file paths
//! - Create a default configuration file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use shardscope_config::{ConfigLoader, ShardscopeConfig};

use super::{load_config, print_info};
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show(ShowArgs),

    /// Get a specific configuration value
    Get(GetArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Show configuration file paths
    Path(PathArgs),

    /// Create a default configuration file
    Init(InitArgs),
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON instead of TOML
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Configuration key (e.g., "aggregator.shard_timeout_ms")
    key: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., "aggregator.shard_timeout_ms")
    key: String,

    /// Value to set
    value: String,

    /// Set in global config (~/.shardscope/config.toml) instead of local
    #[arg(long)]
    global: bool,
}

#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Create the global config instead of one in the current directory
    #[arg(long)]
    global: bool,
}

/// Configuration paths
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    /// Global config file path
    pub global: Option<PathBuf>,
    /// Local config file path
    pub local: PathBuf,
    pub global_exists: bool,
    pub local_exists: bool,
    /// Explicit `--config` file, if any
    pub explicit: Option<PathBuf>,
}

/// Execute the config command
pub async fn execute(cmd: ConfigCommand, global: GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Show(args) => execute_show(args, global).await,
        ConfigCommand::Get(args) => execute_get(args, global).await,
        ConfigCommand::Set(args) => execute_set(args, global).await,
        ConfigCommand::Path(args) => execute_path(args, global).await,
        ConfigCommand::Init(args) => execute_init(args, global).await,
    }
}

async fn execute_show(args: ShowArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!(
            "{}",
            toml::to_string_pretty(&config).context("Failed to render configuration")?
        );
    }

    Ok(())
}

async fn execute_get(args: GetArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;

    let value = get_config_value(&config, &args.key)
        .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", args.key))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        match value {
            serde_json::Value::String(s) => println!("{}", s),
            serde_json::Value::Bool(b) => println!("{}", b),
            serde_json::Value::Number(n) => println!("{}", n),
            serde_json::Value::Null => println!("null"),
            other => println!("{}", serde_json::to_string_pretty(&other)?),
        }
    }

    Ok(())
}

async fn execute_set(args: SetArgs, global: GlobalOptions) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let mut loader = ConfigLoader::new();

    let mut config = if args.global {
        loader.load_global()?.unwrap_or_default()
    } else {
        loader.load_local(&cwd)?.unwrap_or_default()
    };

    set_config_value(&mut config, &args.key, &args.value)
        .with_context(|| format!("Failed to set configuration key: {}", args.key))?;
    config.validate()?;

    let scope = if args.global {
        loader.save_global(&config)?;
        "global"
    } else {
        loader.save_local(&cwd, &config)?;
        "local"
    };
    print_info(
        &format!("Set {} = {} in {} config", args.key, args.value, scope),
        global.quiet,
    );

    Ok(())
}

async fn execute_path(args: PathArgs, global: GlobalOptions) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let loader = ConfigLoader::new();

    let global_path = loader.global_config_path();
    let local_path = loader.local_config_path(&cwd);

    let paths = ConfigPaths {
        global_exists: global_path.as_ref().is_some_and(|p| p.exists()),
        global: global_path,
        local_exists: local_path.exists(),
        local: local_path,
        explicit: global.config.clone(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
        return Ok(());
    }

    println!("Configuration Paths");
    println!("===================\n");

    if let Some(ref gp) = paths.global {
        println!("Global: {} ({})", gp.display(), exists_label(paths.global_exists));
    } else {
        println!("Global: not available (no home directory)");
    }
    println!(
        "Local:  {} ({})",
        paths.local.display(),
        exists_label(paths.local_exists)
    );
    if let Some(ref explicit) = paths.explicit {
        println!("Explicit: {} (overrides both)", explicit.display());
    }

    Ok(())
}

async fn execute_init(args: InitArgs, global: GlobalOptions) -> Result<()> {
    let loader = ConfigLoader::new();

    let path = if args.global {
        loader.init_global()?
    } else {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        loader.init_local(&cwd)?
    };

    print_info(&format!("Config file: {}", path.display()), global.quiet);
    Ok(())
}

fn exists_label(exists: bool) -> &'static str {
    if exists {
        "exists"
    } else {
        "not found"
    }
}

/// Get a configuration value by dotted key path
fn get_config_value(config: &ShardscopeConfig, key: &str) -> Option<serde_json::Value> {
    let json = serde_json::to_value(config).ok()?;

    let mut current = &json;
    for part in key.split('.') {
        current = match current {
            serde_json::Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            other => other.get(part)?,
        };
    }

    Some(current.clone())
}

/// Set a configuration value by dotted key path
fn set_config_value(config: &mut ShardscopeConfig, key: &str, value: &str) -> Result<()> {
    match key {
        // Aggregator
        "aggregator.shard_timeout_ms" => config.aggregator.shard_timeout_ms = value.parse()?,
        "aggregator.default_per_page" => config.aggregator.default_per_page = value.parse()?,
        "aggregator.max_per_page" => config.aggregator.max_per_page = value.parse()?,
        "aggregator.max_search_len" => config.aggregator.max_search_len = value.parse()?,
        "aggregator.hierarchy_fallback" => {
            config.aggregator.hierarchy_fallback = value.parse()?
        }
        "aggregator.foreign_shards" => config.aggregator.foreign_shards = value.parse()?,

        // Logging
        "logging.level" => config.logging.level = value.to_string(),
        "logging.format" => config.logging.format = value.parse()?,

        _ => anyhow::bail!("Unknown or read-only configuration key: {}", key),
    }

    Ok(())
}
