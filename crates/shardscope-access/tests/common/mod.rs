//! Common test utilities for shardscope-access integration tests.
//!
//! Builds in-memory and SQLite shard fixtures and aggregators over them.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use shardscope_access::{
    Actor, CrossShardAggregator, GlobalPage, MemoryShardClient, PageRequest, RoleFlags,
    ShardClient, ShardRegistry,
};
use shardscope_config::{AggregatorConfig, ShardConfig, ShardscopeConfig};
use shardscope_store::{DelegationEdge, ShardDatabase, Subject};
use tempfile::TempDir;

/// `n` subjects with ids `{prefix}-{i}`, newest first is `{prefix}-{n}`.
pub fn subjects(prefix: &str, n: usize) -> Vec<Subject> {
    (1..=n)
        .map(|i| {
            Subject::new(
                format!("{}-{:02}", prefix, i),
                format!("{} user {}", prefix, i),
                format!("{}{}@{}.example", prefix, i, prefix),
                i as i64,
            )
        })
        .collect()
}

/// In-memory shard holding `n` generated subjects.
pub fn memory_shard(prefix: &str, n: usize) -> Arc<MemoryShardClient> {
    Arc::new(MemoryShardClient::new().with_subjects(subjects(prefix, n)))
}

/// Registry over the given shards, in order.
pub fn registry(shards: &[(&str, Arc<MemoryShardClient>)]) -> Arc<ShardRegistry> {
    let mut registry = ShardRegistry::new();
    for (key, client) in shards {
        let client: Arc<dyn ShardClient> = client.clone();
        registry
            .register(*key, key.to_uppercase(), client)
            .expect("Failed to register shard");
    }
    Arc::new(registry)
}

/// Settings with a short timeout so slow-shard tests stay fast.
pub fn settings() -> AggregatorConfig {
    AggregatorConfig {
        shard_timeout_ms: 200,
        ..Default::default()
    }
}

pub fn aggregator(shards: &[(&str, Arc<MemoryShardClient>)]) -> CrossShardAggregator {
    CrossShardAggregator::new(registry(shards), settings())
}

pub fn admin(shard: &str) -> Actor {
    Actor::new("root", shard, RoleFlags::admin())
}

pub fn manager(id: &str, shard: &str) -> Actor {
    Actor::new(id, shard, RoleFlags::manager())
}

pub fn superior(id: &str, shard: &str) -> Actor {
    Actor::new(id, shard, RoleFlags::superior())
}

/// `(shard_key, subject_id)` pairs of a page, in order.
pub fn keys(page: &GlobalPage) -> Vec<(String, String)> {
    page.items
        .iter()
        .map(|item| (item.shard_key.clone(), item.subject.id.clone()))
        .collect()
}

/// Fetch a page, panicking on error.
pub async fn page(aggregator: &CrossShardAggregator, request: PageRequest) -> GlobalPage {
    aggregator
        .get_page(&request)
        .await
        .expect("Failed to assemble page")
}

/// Create SQLite shard databases in a temporary directory.
///
/// Returns (temp_dir, config) where the config lists the shards in order.
pub fn sqlite_shards(
    shards: &[(&str, Vec<Subject>, Vec<DelegationEdge>)],
) -> (TempDir, ShardscopeConfig) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut config = ShardscopeConfig::default();

    for (key, subjects, edges) in shards {
        let path: PathBuf = temp_dir.path().join(format!("{}.db", key));
        let db = ShardDatabase::create(&path, key).expect("Failed to create shard");
        db.insert_subjects(subjects).expect("Failed to insert subjects");
        db.insert_edges(edges).expect("Failed to insert edges");

        config
            .shards
            .push(ShardConfig::new(*key, key.to_uppercase(), path));
    }

    config.aggregator = settings();
    (temp_dir, config)
}
