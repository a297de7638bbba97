//! Per-shard query execution.
//!
//! Applies the per-shard timeout and maps store failures into
//! shard-attributed access errors.

use std::future::Future;
use std::time::Duration;

use shardscope_store::{
    DelegationEdge, RelationshipType, StoreError, Subject, SubjectFilter, SubjectId,
};
use tracing::debug;

use crate::error::AccessError;
use crate::registry::RegisteredShard;
use crate::types::AccessRestriction;
use crate::Result;

/// Runs count, fetch, and delegation reads against a single shard.
#[derive(Debug, Clone, Copy)]
pub struct ShardQueryExecutor {
    timeout: Duration,
}

impl ShardQueryExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Count subjects matching `filter` under `restriction`.
    ///
    /// An empty `Only` restriction returns zero without contacting the shard.
    pub async fn count(
        &self,
        shard: &RegisteredShard,
        filter: &SubjectFilter,
        restriction: &AccessRestriction,
    ) -> Result<u64> {
        if restriction.is_empty_set() {
            debug!("Shard '{}': empty restriction, count skipped", shard.key());
            return Ok(0);
        }

        self.bounded(shard, shard.client.count_subjects(filter, restriction.ids()))
            .await
    }

    /// Fetch the slice `[offset, offset + limit)` of the shard's ordered listing.
    pub async fn fetch_page(
        &self,
        shard: &RegisteredShard,
        filter: &SubjectFilter,
        restriction: &AccessRestriction,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Subject>> {
        if restriction.is_empty_set() || limit == 0 {
            return Ok(Vec::new());
        }

        self.bounded(
            shard,
            shard
                .client
                .fetch_subjects(filter, restriction.ids(), offset, limit),
        )
        .await
    }

    /// Read delegation edges. Failures surface as `ShardUnreachable`/`ShardTimeout`;
    /// the resolver reclassifies them.
    pub async fn delegation_edges(
        &self,
        shard: &RegisteredShard,
        superior_ids: &[SubjectId],
        relationship: Option<RelationshipType>,
    ) -> Result<Vec<DelegationEdge>> {
        if superior_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.bounded(
            shard,
            shard.client.delegation_edges(superior_ids, relationship),
        )
        .await
    }

    async fn bounded<T>(
        &self,
        shard: &RegisteredShard,
        call: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AccessError::shard_unreachable(shard.key(), e.to_string())),
            Err(_) => Err(AccessError::shard_timeout(
                shard.key(),
                self.timeout.as_millis() as u64,
            )),
        }
    }
}
