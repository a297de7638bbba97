//! In-memory shard client with fault injection.
//!
//! Mirrors the filter and ordering semantics of the SQLite store. Used by
//! tests to simulate failing, slow, or shrinking shards.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shardscope_store::{
    DelegationEdge, RelationshipType, StoreError, Subject, SubjectFilter, SubjectId,
};

use crate::traits::ShardClient;

#[derive(Default)]
struct Faults {
    fail_count: AtomicBool,
    fail_fetch: AtomicBool,
    fail_edges: AtomicBool,
    /// Subjects to delete right before the next fetch is served
    shrink_before_fetch: AtomicUsize,
}

#[derive(Default)]
struct CallCounts {
    count: AtomicUsize,
    fetch: AtomicUsize,
    edges: AtomicUsize,
}

/// Shard held entirely in memory.
#[derive(Default)]
pub struct MemoryShardClient {
    subjects: RwLock<Vec<Subject>>,
    edges: RwLock<Vec<DelegationEdge>>,
    faults: Faults,
    calls: CallCounts,
    latency: Mutex<Option<Duration>>,
}

impl MemoryShardClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add subjects.
    pub fn with_subjects(self, subjects: impl IntoIterator<Item = Subject>) -> Self {
        self.subjects.write().extend(subjects);
        self
    }

    /// Builder: add delegation edges, ignoring duplicates.
    pub fn with_edges(self, edges: impl IntoIterator<Item = DelegationEdge>) -> Self {
        for edge in edges {
            let _ = self.add_edge(edge);
        }
        self
    }

    /// Add an edge; at most one edge per (superior, subordinate) pair.
    pub fn add_edge(&self, edge: DelegationEdge) -> Result<(), StoreError> {
        let mut edges = self.edges.write();
        if edges.iter().any(|e| {
            e.superior_id == edge.superior_id && e.subordinate_id == edge.subordinate_id
        }) {
            return Err(StoreError::DuplicateEdge {
                superior: edge.superior_id,
                subordinate: edge.subordinate_id,
            });
        }
        edges.push(edge);
        Ok(())
    }

    // =========================================================================
    // Fault Injection
    // =========================================================================

    pub fn set_fail_count(&self, fail: bool) {
        self.faults.fail_count.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.faults.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_edges(&self, fail: bool) {
        self.faults.fail_edges.store(fail, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Delete the `n` newest subjects right before the next fetch, as if
    /// another writer removed them between count and fetch.
    pub fn shrink_before_fetch(&self, n: usize) {
        self.faults.shrink_before_fetch.store(n, Ordering::SeqCst);
    }

    // =========================================================================
    // Call Counters
    // =========================================================================

    pub fn count_calls(&self) -> usize {
        self.calls.count.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.calls.fetch.load(Ordering::SeqCst)
    }

    pub fn edge_calls(&self) -> usize {
        self.calls.edges.load(Ordering::SeqCst)
    }

    /// Total calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.count_calls() + self.fetch_calls() + self.edge_calls()
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn matching(&self, filter: &SubjectFilter, ids: Option<&[SubjectId]>) -> Vec<Subject> {
        let allowed: Option<HashSet<&str>> = ids.map(|ids| ids.iter().map(String::as_str).collect());
        let mut matched: Vec<Subject> = self
            .subjects
            .read()
            .iter()
            .filter(|s| filter.matches(s))
            .filter(|s| allowed.as_ref().is_none_or(|a| a.contains(s.id.as_str())))
            .cloned()
            .collect();
        matched.sort_by(Subject::listing_order);
        matched
    }

    fn apply_shrink(&self) {
        let n = self.faults.shrink_before_fetch.swap(0, Ordering::SeqCst);
        if n == 0 {
            return;
        }
        let mut subjects = self.subjects.write();
        subjects.sort_by(Subject::listing_order);
        let n = n.min(subjects.len());
        subjects.drain(..n);
    }
}

fn injected(operation: &str) -> StoreError {
    StoreError::unavailable(format!("injected {} failure", operation))
}

#[async_trait]
impl ShardClient for MemoryShardClient {
    async fn count_subjects(
        &self,
        filter: &SubjectFilter,
        ids: Option<&[SubjectId]>,
    ) -> Result<u64, StoreError> {
        self.calls.count.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.faults.fail_count.load(Ordering::SeqCst) {
            return Err(injected("count"));
        }
        Ok(self.matching(filter, ids).len() as u64)
    }

    async fn fetch_subjects(
        &self,
        filter: &SubjectFilter,
        ids: Option<&[SubjectId]>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Subject>, StoreError> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.faults.fail_fetch.load(Ordering::SeqCst) {
            return Err(injected("fetch"));
        }
        self.apply_shrink();

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .matching(filter, ids)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn delegation_edges(
        &self,
        superior_ids: &[SubjectId],
        relationship: Option<RelationshipType>,
    ) -> Result<Vec<DelegationEdge>, StoreError> {
        self.calls.edges.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.faults.fail_edges.load(Ordering::SeqCst) {
            return Err(injected("delegation"));
        }

        let superiors: HashSet<&str> = superior_ids.iter().map(String::as_str).collect();
        Ok(self
            .edges
            .read()
            .iter()
            .filter(|e| superiors.contains(e.superior_id.as_str()))
            .filter(|e| relationship.is_none_or(|r| e.relationship_type == r))
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.simulate_latency().await;
        if self.faults.fail_count.load(Ordering::SeqCst) {
            return Err(injected("health"));
        }
        Ok(())
    }
}
