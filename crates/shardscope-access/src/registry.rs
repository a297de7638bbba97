//! Shard registry.
//!
//! Static directory of the shards a deployment knows about, in declared order.
//! The declared order is the iteration order used for pagination, so it never
//! changes at runtime.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use shardscope_config::ShardscopeConfig;
use tracing::{debug, info, warn};

use crate::error::AccessError;
use crate::sqlite::SqliteShardClient;
use crate::traits::ShardClient;
use crate::types::{ShardHealth, ShardInfo};

/// A shard entry: identity plus its data-access client.
#[derive(Clone)]
pub struct RegisteredShard {
    pub info: ShardInfo,
    pub client: Arc<dyn ShardClient>,
}

impl RegisteredShard {
    pub fn key(&self) -> &str {
        &self.info.key
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }
}

impl std::fmt::Debug for RegisteredShard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredShard")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Ordered directory of shards.
#[derive(Debug, Default, Clone)]
pub struct ShardRegistry {
    shards: Vec<RegisteredShard>,
}

impl ShardRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry of SQLite shards from configuration.
    ///
    /// Databases are opened lazily, so an unreachable shard does not prevent
    /// the registry from being built.
    pub fn from_config(config: &ShardscopeConfig) -> Result<Self, AccessError> {
        config.validate()?;

        let mut registry = Self::new();
        for shard in &config.shards {
            registry.register(
                &shard.key,
                &shard.name,
                Arc::new(SqliteShardClient::new(shard)),
            )?;
        }

        info!("Registered {} shard(s)", registry.len());
        Ok(registry)
    }

    /// Append a shard. Keys must be unique.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        client: Arc<dyn ShardClient>,
    ) -> Result<(), AccessError> {
        let key = key.into();
        if self.contains(&key) {
            return Err(AccessError::with_context(
                "registering shard",
                format!("shard '{}' is already registered", key),
            ));
        }

        debug!("Registering shard '{}'", key);
        self.shards.push(RegisteredShard {
            info: ShardInfo {
                key,
                name: name.into(),
            },
            client,
        });
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_shard(
        mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        client: Arc<dyn ShardClient>,
    ) -> Result<Self, AccessError> {
        self.register(key, name, client)?;
        Ok(self)
    }

    /// Look up a shard, rejecting unknown keys.
    pub fn get(&self, key: &str) -> Result<&RegisteredShard, AccessError> {
        self.shards
            .iter()
            .find(|s| s.info.key == key)
            .ok_or_else(|| AccessError::invalid_shard_key(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.shards.iter().any(|s| s.info.key == key)
    }

    /// Shards in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredShard> {
        self.shards.iter()
    }

    /// Shard identities in declared order.
    pub fn list(&self) -> Vec<ShardInfo> {
        self.shards.iter().map(|s| s.info.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Probe every shard concurrently, each bounded by `timeout`.
    pub async fn health(&self, timeout: Duration) -> Vec<ShardHealth> {
        let probes = self.shards.iter().map(|shard| async move {
            let started = Instant::now();
            let outcome = tokio::time::timeout(timeout, shard.client.health_check()).await;
            let latency_ms = started.elapsed().as_millis() as u64;

            let message = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => Some(format!("timed out after {}ms", timeout.as_millis())),
            };

            if let Some(ref reason) = message {
                warn!("Shard '{}' unhealthy: {}", shard.key(), reason);
            }

            ShardHealth {
                key: shard.info.key.clone(),
                name: shard.info.name.clone(),
                healthy: message.is_none(),
                message,
                latency_ms,
            }
        });

        join_all(probes).await
    }
}
