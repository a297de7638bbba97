//! Shards command - Inspect and provision the shard directory

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Deserialize;
use shardscope_config::ShardConfig;
use shardscope_store::{DelegationEdge, ShardDatabase, StoreError, Subject};

use super::{create_registry, load_config, print_info, print_warning};
use crate::GlobalOptions;

/// Shard directory commands
#[derive(Subcommand, Debug)]
pub enum ShardsCommand {
    /// List configured shards in iteration order
    List(ListArgs),

    /// Probe every shard and report its health
    Check(CheckArgs),

    /// Show row counts per shard
    Stats(StatsArgs),

    /// Create an empty database for a configured shard
    Init(InitArgs),

    /// Load subjects and delegation edges from a JSON file
    Import(ImportArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Shard key from the configuration
    key: String,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Shard key from the configuration
    key: String,

    /// JSON file with `subjects` and `edges` arrays
    file: PathBuf,
}

/// Contents of an import file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ShardSeed {
    subjects: Vec<Subject>,
    edges: Vec<DelegationEdge>,
}

/// Execute shards commands
pub async fn execute(cmd: ShardsCommand, global: GlobalOptions) -> Result<()> {
    match cmd {
        ShardsCommand::List(args) => execute_list(args, global).await,
        ShardsCommand::Check(args) => execute_check(args, global).await,
        ShardsCommand::Stats(args) => execute_stats(args, global).await,
        ShardsCommand::Init(args) => execute_init(args, global).await,
        ShardsCommand::Import(args) => execute_import(args, global).await,
    }
}

async fn execute_list(args: ListArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;

    if config.shards.is_empty() {
        if !global.quiet {
            println!("No shards configured.");
            println!("\nAdd shards to .shardscope/config.toml:");
            println!("  [[shards]]");
            println!("  key = \"north\"");
            println!("  name = \"North\"");
            println!("  path = \"/var/lib/shardscope/north.db\"");
        }
        return Ok(());
    }

    if args.json {
        let json: Vec<_> = config
            .shards
            .iter()
            .map(|s| {
                serde_json::json!({
                    "key": s.key,
                    "name": s.name,
                    "path": s.path,
                    "read_only": s.read_only,
                    "exists": s.path.exists(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print_info("Configured shards:\n", global.quiet);
        for shard in &config.shards {
            let status = if shard.path.exists() {
                ""
            } else {
                " [missing]"
            };
            let mode = if shard.read_only { " (read-only)" } else { "" };
            println!(
                "  {} - {}{}{} - {}",
                shard.key,
                shard.name,
                mode,
                status,
                shard.path.display()
            );
        }
    }

    Ok(())
}

async fn execute_check(args: CheckArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let registry = create_registry(&config)?;
    let timeout = Duration::from_millis(config.aggregator.shard_timeout_ms);

    let report = registry.health(timeout).await;
    let unhealthy = report.iter().filter(|h| !h.healthy).count();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for health in &report {
            if health.healthy {
                println!("  [OK]   {} ({}ms)", health.key, health.latency_ms);
            } else {
                println!(
                    "  [FAIL] {}: {}",
                    health.key,
                    health.message.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    if unhealthy > 0 {
        anyhow::bail!("{} of {} shards unhealthy", unhealthy, report.len());
    }

    print_info(
        &format!("\nAll {} shards healthy", report.len()),
        global.quiet || args.json,
    );
    Ok(())
}

async fn execute_stats(args: StatsArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;

    let mut rows = Vec::with_capacity(config.shards.len());
    for shard in &config.shards {
        let stats = ShardDatabase::open(&shard.path, &shard.key, shard.read_only)
            .and_then(|db| db.stats());
        match stats {
            Ok(stats) => rows.push((shard, Some(stats))),
            Err(e) => {
                print_warning(&format!("shard '{}': {}", shard.key, e));
                rows.push((shard, None));
            }
        }
    }

    if args.json {
        let json: Vec<_> = rows
            .iter()
            .map(|(shard, stats)| {
                serde_json::json!({
                    "key": shard.key,
                    "name": shard.name,
                    "stats": stats,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        for (shard, stats) in &rows {
            match stats {
                Some(stats) => println!(
                    "  {}: {} subjects, {} edges",
                    shard.key, stats.subject_count, stats.edge_count
                ),
                None => println!("  {}: unavailable", shard.key),
            }
        }
    }

    Ok(())
}

async fn execute_init(args: InitArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let shard = configured_shard(&config.shards, &args.key)?;

    if shard.path.exists() {
        anyhow::bail!(
            "Shard '{}' already has a database at {}",
            shard.key,
            shard.path.display()
        );
    }

    ShardDatabase::create(&shard.path, &shard.key)
        .with_context(|| format!("Failed to create shard database for '{}'", shard.key))?;

    print_info(
        &format!(
            "Created shard '{}' at {}",
            shard.key,
            shard.path.display()
        ),
        global.quiet,
    );
    Ok(())
}

async fn execute_import(args: ImportArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let shard = configured_shard(&config.shards, &args.key)?;
    if shard.read_only {
        anyhow::bail!("Shard '{}' is configured read-only", shard.key);
    }

    let seed = read_seed(&args.file)?;
    let db = if shard.path.exists() {
        ShardDatabase::open(&shard.path, &shard.key, false)
    } else {
        ShardDatabase::create(&shard.path, &shard.key)
    }
    .with_context(|| format!("Failed to open shard '{}'", shard.key))?;

    db.insert_subjects(&seed.subjects)
        .context("Failed to import subjects")?;

    let mut skipped = 0usize;
    for edge in &seed.edges {
        match db.insert_edge(edge) {
            Ok(()) => {}
            Err(StoreError::DuplicateEdge { .. }) => skipped += 1,
            Err(e) => return Err(e).context("Failed to import delegation edge"),
        }
    }

    print_info(
        &format!(
            "Imported {} subjects and {} edges into '{}' ({} duplicate edges skipped)",
            seed.subjects.len(),
            seed.edges.len() - skipped,
            shard.key,
            skipped
        ),
        global.quiet,
    );
    Ok(())
}

fn configured_shard<'a>(shards: &'a [ShardConfig], key: &str) -> Result<&'a ShardConfig> {
    shards
        .iter()
        .find(|s| s.key == key)
        .ok_or_else(|| anyhow::anyhow!("Shard '{}' is not configured", key))
}

fn read_seed(path: &Path) -> Result<ShardSeed> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid import file {}", path.display()))
}
