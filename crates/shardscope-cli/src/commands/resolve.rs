//! Resolve command - Show an actor's accessible set

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use shardscope_access::{
    AccessibleSet, HierarchyResolver, ShardQueryExecutor, DEFAULT_DELEGATION_HOPS,
    MAX_DELEGATION_HOPS,
};

use super::{create_registry, load_config, print_info, ActorArgs};
use crate::GlobalOptions;

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    actor: ActorArgs,

    /// Delegation hops to follow for superior managers
    #[arg(long, short = 'd', default_value_t = DEFAULT_DELEGATION_HOPS)]
    depth: usize,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let registry = create_registry(&config)?;
    let shard = registry.get(&args.actor.actor_shard)?;

    if args.depth > MAX_DELEGATION_HOPS {
        print_info(
            &format!(
                "Depth {} exceeds the maximum, using {}",
                args.depth, MAX_DELEGATION_HOPS
            ),
            global.quiet,
        );
    }

    let executor =
        ShardQueryExecutor::new(Duration::from_millis(config.aggregator.shard_timeout_ms));
    let actor = args.actor.to_actor();
    let set = HierarchyResolver::new(executor)
        .resolve_with_depth(&actor, shard, args.depth)
        .await
        .context("Failed to resolve accessible subjects")?;

    if args.json {
        let json = serde_json::json!({
            "actor": actor.id,
            "shard": shard.key(),
            "scope": actor.roles.scope(),
            "accessible": set,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    match set {
        AccessibleSet::All => println!("{} may see every subject in every shard", actor.id),
        AccessibleSet::Subjects(ids) if ids.is_empty() => {
            println!("{} may see no subjects", actor.id)
        }
        AccessibleSet::Subjects(ids) => {
            print_info(
                &format!(
                    "{} may see {} subjects in '{}':\n",
                    actor.id,
                    ids.len(),
                    shard.key()
                ),
                global.quiet,
            );
            for id in ids {
                println!("  {}", id);
            }
        }
    }

    Ok(())
}
