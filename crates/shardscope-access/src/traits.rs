//! Shard client trait definition.
//!
//! Defines the async data-access interface every shard store must expose.

use async_trait::async_trait;
use shardscope_store::{DelegationEdge, RelationshipType, Subject, SubjectFilter, SubjectId, StoreError};

/// Read-only client for one shard.
///
/// Implemented by the SQLite store and by the in-memory store used in tests.
/// Any concrete store that can answer these four reads can back a shard.
#[async_trait]
pub trait ShardClient: Send + Sync {
    /// Count subjects matching the filter.
    ///
    /// # Arguments
    /// * `filter` - Shard-local predicates
    /// * `ids` - When set, only subjects whose id is in this list are counted
    async fn count_subjects(
        &self,
        filter: &SubjectFilter,
        ids: Option<&[SubjectId]>,
    ) -> Result<u64, StoreError>;

    /// Fetch one slice of matching subjects.
    ///
    /// Results are ordered by creation time descending (id descending on ties).
    /// This is the only ordering guarantee.
    async fn fetch_subjects(
        &self,
        filter: &SubjectFilter,
        ids: Option<&[SubjectId]>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Subject>, StoreError>;

    /// Delegation edges whose superior is one of `superior_ids`.
    ///
    /// # Arguments
    /// * `superior_ids` - Superiors to expand
    /// * `relationship` - Optional relationship-type equality
    async fn delegation_edges(
        &self,
        superior_ids: &[SubjectId],
        relationship: Option<RelationshipType>,
    ) -> Result<Vec<DelegationEdge>, StoreError>;

    /// Check that the shard answers queries.
    async fn health_check(&self) -> Result<(), StoreError>;
}
