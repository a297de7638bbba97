//! Hierarchy resolution.
//!
//! Computes the set of subjects an actor may see from the delegation graph of
//! the actor's own shard. Traversal is breadth-first, bounded by a hop count,
//! and tracks visited superiors so cycles in the store terminate.

use std::collections::{BTreeSet, HashSet};

use shardscope_store::{DelegationEdge, RelationshipType, SubjectId};
use tracing::{debug, warn};

use crate::error::AccessError;
use crate::executor::ShardQueryExecutor;
use crate::registry::RegisteredShard;
use crate::types::{AccessibleSet, Actor, RoleScope};
use crate::Result;

/// Hops for a superior manager: superior -> manager -> user.
pub const DEFAULT_DELEGATION_HOPS: usize = 2;

/// Upper bound on any traversal. The store does not prevent cycles.
pub const MAX_DELEGATION_HOPS: usize = 10;

/// Resolves actors to accessible sets within one shard.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyResolver {
    executor: ShardQueryExecutor,
}

impl HierarchyResolver {
    pub fn new(executor: ShardQueryExecutor) -> Self {
        Self { executor }
    }

    /// Resolve with the standard two-hop depth.
    pub async fn resolve(&self, actor: &Actor, shard: &RegisteredShard) -> Result<AccessibleSet> {
        self.resolve_with_depth(actor, shard, DEFAULT_DELEGATION_HOPS)
            .await
    }

    /// Resolve with an explicit hop bound, clamped to `1..=MAX_DELEGATION_HOPS`.
    ///
    /// Depth only affects superior managers. Every hop before the last reads
    /// edges of any type and expands through `superior_manager_to_manager`
    /// edges; the last hop (when it is not the first) reads `manager_to_user`
    /// edges only.
    pub async fn resolve_with_depth(
        &self,
        actor: &Actor,
        shard: &RegisteredShard,
        depth: usize,
    ) -> Result<AccessibleSet> {
        match actor.roles.scope() {
            RoleScope::All => Ok(AccessibleSet::All),
            RoleScope::NoAccess => Ok(AccessibleSet::empty()),
            RoleScope::Manager => {
                let edges = self
                    .edges(
                        shard,
                        std::slice::from_ref(&actor.id),
                        Some(RelationshipType::ManagerToUser),
                    )
                    .await?;
                let ids: BTreeSet<SubjectId> =
                    edges.into_iter().map(|e| e.subordinate_id).collect();
                debug!(
                    "Manager '{}' on shard '{}': {} subject(s)",
                    actor.id,
                    shard.key(),
                    ids.len()
                );
                Ok(AccessibleSet::Subjects(ids))
            }
            RoleScope::Superior => {
                let depth = depth.clamp(1, MAX_DELEGATION_HOPS);
                let ids = self.walk(actor, shard, depth).await?;
                debug!(
                    "Superior '{}' on shard '{}': {} subject(s) within {} hop(s)",
                    actor.id,
                    shard.key(),
                    ids.len(),
                    depth
                );
                Ok(AccessibleSet::Subjects(ids))
            }
        }
    }

    async fn walk(
        &self,
        actor: &Actor,
        shard: &RegisteredShard,
        depth: usize,
    ) -> Result<BTreeSet<SubjectId>> {
        let mut accessible = BTreeSet::new();
        let mut visited: HashSet<SubjectId> = HashSet::from([actor.id.clone()]);
        let mut frontier = vec![actor.id.clone()];

        for hop in 1..=depth {
            if frontier.is_empty() {
                break;
            }

            // Direct reports of any kind on the first hop
            let relationship = if hop > 1 && hop == depth {
                Some(RelationshipType::ManagerToUser)
            } else {
                None
            };

            let edges = self.edges(shard, &frontier, relationship).await?;

            let mut next = Vec::new();
            for edge in edges {
                if edge.relationship_type == RelationshipType::SuperiorManagerToManager
                    && hop < depth
                    && visited.insert(edge.subordinate_id.clone())
                {
                    next.push(edge.subordinate_id.clone());
                }
                accessible.insert(edge.subordinate_id);
            }
            frontier = next;
        }

        Ok(accessible)
    }

    async fn edges(
        &self,
        shard: &RegisteredShard,
        superior_ids: &[SubjectId],
        relationship: Option<RelationshipType>,
    ) -> Result<Vec<DelegationEdge>> {
        self.executor
            .delegation_edges(shard, superior_ids, relationship)
            .await
            .map_err(|e| {
                warn!("Delegation lookup failed on shard '{}': {}", shard.key(), e);
                AccessError::hierarchy_unavailable(shard.key(), e.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryShardClient;
    use crate::types::{RoleFlags, ShardInfo};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn shard(client: Arc<MemoryShardClient>) -> RegisteredShard {
        RegisteredShard {
            info: ShardInfo {
                key: "north".to_string(),
                name: "North".to_string(),
            },
            client,
        }
    }

    fn resolver() -> HierarchyResolver {
        HierarchyResolver::new(ShardQueryExecutor::new(Duration::from_secs(1)))
    }

    fn ids(set: &AccessibleSet) -> Vec<&str> {
        match set {
            AccessibleSet::All => vec!["*"],
            AccessibleSet::Subjects(ids) => ids.iter().map(String::as_str).collect(),
        }
    }

    #[tokio::test]
    async fn test_manager_ignores_manager_edges() {
        let client = Arc::new(MemoryShardClient::new().with_edges([
            DelegationEdge::manages_user("m", "u1"),
            DelegationEdge::manages_manager("m", "m2"),
            DelegationEdge::manages_user("m2", "u2"),
        ]));
        let actor = Actor::new("m", "north", RoleFlags::manager());

        let set = resolver().resolve(&actor, &shard(client)).await.unwrap();
        assert_eq!(ids(&set), vec!["u1"]);
    }

    #[tokio::test]
    async fn test_superior_direct_users_included() {
        let client = Arc::new(MemoryShardClient::new().with_edges([
            DelegationEdge::manages_user("a", "u0"),
            DelegationEdge::manages_manager("a", "m1"),
            DelegationEdge::manages_user("m1", "u1"),
        ]));
        let actor = Actor::new("a", "north", RoleFlags::superior());

        let set = resolver().resolve(&actor, &shard(client)).await.unwrap();
        assert_eq!(ids(&set), vec!["m1", "u0", "u1"]);
    }

    #[tokio::test]
    async fn test_depth_is_clamped() {
        // a -> b -> c -> ... -> l, twelve levels of managers
        let names: Vec<String> = (b'a'..=b'l').map(|c| (c as char).to_string()).collect();
        let mut edges: Vec<_> = names
            .windows(2)
            .map(|w| DelegationEdge::manages_manager(w[0].as_str(), w[1].as_str()))
            .collect();
        edges.push(DelegationEdge::manages_user("l", "user"));
        let client = Arc::new(MemoryShardClient::new().with_edges(edges));
        let shard = shard(Arc::clone(&client));
        let actor = Actor::new("a", "north", RoleFlags::superior());

        let deep = resolver()
            .resolve_with_depth(&actor, &shard, 50)
            .await
            .unwrap();
        assert_eq!(client.edge_calls(), MAX_DELEGATION_HOPS);
        // Nine manager hops, then a manager_to_user hop from 'j' finds nothing
        assert_eq!(deep.len(), Some(9));
        assert!(!deep.contains("user"));

        let shallow = resolver()
            .resolve_with_depth(&actor, &shard, 0)
            .await
            .unwrap();
        assert_eq!(ids(&shallow), vec!["b"]);
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let client = Arc::new(MemoryShardClient::new().with_edges([
            DelegationEdge::manages_manager("a", "b"),
            DelegationEdge::manages_manager("b", "c"),
            DelegationEdge::manages_manager("c", "a"),
            DelegationEdge::manages_user("c", "u"),
        ]));
        let shard = shard(Arc::clone(&client));
        let actor = Actor::new("a", "north", RoleFlags::superior());

        let set = resolver()
            .resolve_with_depth(&actor, &shard, MAX_DELEGATION_HOPS)
            .await
            .unwrap();
        // Intermediate hops take edges of any type. The edge back to 'a' is
        // reported like any other but not walked again.
        assert_eq!(ids(&set), vec!["a", "b", "c", "u"]);
        // a, then b, then c; the walk stops once 'a' is seen again
        assert_eq!(client.edge_calls(), 3);
    }

    #[tokio::test]
    async fn test_edge_failure_is_hierarchy_unavailable() {
        let client = Arc::new(MemoryShardClient::new());
        client.set_fail_edges(true);
        let actor = Actor::new("m", "north", RoleFlags::manager());

        let err = resolver()
            .resolve(&actor, &shard(client))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::HierarchyUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_non_hierarchy_scopes_skip_the_store() {
        let client = Arc::new(MemoryShardClient::new());
        client.set_fail_edges(true);
        let shard = shard(Arc::clone(&client));

        let admin = Actor::new("x", "north", RoleFlags::admin());
        assert!(resolver().resolve(&admin, &shard).await.unwrap().is_all());

        let nobody = Actor::new("x", "north", RoleFlags::new(false, true, true));
        assert!(resolver().resolve(&nobody, &shard).await.unwrap().is_empty());

        assert_eq!(client.edge_calls(), 0);
    }
}
