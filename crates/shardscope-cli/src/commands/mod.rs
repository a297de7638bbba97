//! CLI command implementations
//!
//! This module contains all Shardscope CLI command implementations.

pub mod config;
pub mod resolve;
pub mod shards;
pub mod subjects;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use shardscope_access::{Actor, CrossShardAggregator, RoleFlags, ShardRegistry};
use shardscope_config::{ConfigLoader, ShardscopeConfig};
use tracing::debug;

use crate::GlobalOptions;

/// Identity and role flags of the acting subject
#[derive(Args, Debug, Clone)]
pub struct ActorArgs {
    /// Subject id of the actor
    #[arg(long = "actor", value_name = "ID")]
    pub actor_id: String,

    /// Shard key the actor lives in
    #[arg(long, value_name = "SHARD")]
    pub actor_shard: String,

    /// Actor is an administrator
    #[arg(long)]
    pub admin: bool,

    /// Actor is a manager (requires --admin to have effect)
    #[arg(long)]
    pub manager: bool,

    /// Actor is a superior manager (requires --admin to have effect)
    #[arg(long)]
    pub superior: bool,
}

impl ActorArgs {
    pub fn roles(&self) -> RoleFlags {
        RoleFlags::new(self.admin, self.manager, self.superior)
    }

    pub fn to_actor(&self) -> Actor {
        Actor::new(self.actor_id.clone(), self.actor_shard.clone(), self.roles())
    }
}

/// Load configuration with CLI overrides applied.
///
/// An explicit `--config` file bypasses the global/local merge.
pub fn load_config(global: &GlobalOptions) -> Result<ShardscopeConfig> {
    let overrides = global.to_config_overrides();
    let mut loader = ConfigLoader::new();

    if let Some(ref config_path) = global.config {
        if !config_path.exists() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        }
        return loader
            .load_file(config_path, Some(&overrides))
            .with_context(|| format!("Failed to load config file {}", config_path.display()));
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    loader
        .load(&cwd, Some(&overrides))
        .context("Failed to load configuration")
}

/// Build the shard registry described by the configuration.
pub fn create_registry(config: &ShardscopeConfig) -> Result<Arc<ShardRegistry>> {
    let registry = ShardRegistry::from_config(config).context("Failed to build shard registry")?;
    if registry.is_empty() {
        anyhow::bail!("No shards configured (add [[shards]] entries to config.toml)");
    }
    debug!("Registered {} shards", registry.len());
    Ok(Arc::new(registry))
}

/// Load configuration and build an aggregator over every configured shard.
pub fn create_aggregator(global: &GlobalOptions) -> Result<CrossShardAggregator> {
    let config = load_config(global)?;
    let registry = create_registry(&config)?;
    Ok(CrossShardAggregator::new(registry, config.aggregator))
}

/// Print a warning message to stderr.
pub fn print_warning(message: &str) {
    eprintln!("warning: {}", message);
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
