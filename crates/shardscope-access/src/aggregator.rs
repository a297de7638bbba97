//! Cross-shard aggregation.
//!
//! Produces one globally consistent page from independent shards that share
//! no index. Each request resolves access once, counts every eligible shard
//! concurrently, plans which shards the requested window falls into, and then
//! fetches only those slices.
//!
//! Counts and fetches are separate round trips and are not transactionally
//! consistent: a shard mutated between its count and its fetch may yield a
//! shorter slice than planned. That shortfall is accepted and logged.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{join_all, try_join_all};
use shardscope_config::{AggregatorConfig, ForeignShardPolicy, HierarchyFallback};
use tracing::{debug, info, warn};

use crate::error::AccessError;
use crate::executor::ShardQueryExecutor;
use crate::registry::{RegisteredShard, ShardRegistry};
use crate::request::{SubjectListRequest, SubjectListResponse};
use crate::resolver::HierarchyResolver;
use crate::types::{
    page_count, AccessRestriction, AccessibleSet, Actor, DegradedShard, GlobalPage, PageRequest,
    RoleScope, ShardSubject,
};
use crate::Result;

/// One shard's share of a page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSlice {
    /// Position of the shard in the count list
    pub index: usize,
    pub local_offset: u64,
    pub local_limit: u64,
}

/// Split the global window `[global_offset, global_offset + per_page)` into
/// per-shard slices, walking shards in the given order.
///
/// `counts[i]` is the local count of the i-th shard. Shards the window does not
/// reach produce no slice.
pub fn plan_window(counts: &[u64], global_offset: u64, per_page: u64) -> Vec<WindowSlice> {
    let mut slices = Vec::new();
    let mut cumulative: u64 = 0;
    let mut planned: u64 = 0;

    for (index, &count) in counts.iter().enumerate() {
        if planned >= per_page {
            break;
        }

        let end = cumulative.saturating_add(count);
        if count == 0 || end <= global_offset {
            cumulative = end;
            continue;
        }

        let local_offset = global_offset.saturating_sub(cumulative);
        let local_limit = (per_page - planned).min(count - local_offset);
        slices.push(WindowSlice {
            index,
            local_offset,
            local_limit,
        });

        planned += local_limit;
        cumulative = end;
    }

    slices
}

/// What the aggregator does with a shard for the current request.
#[derive(Debug, Clone)]
enum ShardPlan {
    /// Count and fetch under this restriction
    Query(AccessRestriction),
    /// Not contacted; contributes nothing
    Skip,
}

/// Orchestrates count and fetch across every eligible shard.
pub struct CrossShardAggregator {
    registry: Arc<ShardRegistry>,
    settings: AggregatorConfig,
    executor: ShardQueryExecutor,
    resolver: HierarchyResolver,
}

impl CrossShardAggregator {
    /// Create an aggregator over `registry` with the given settings.
    pub fn new(registry: Arc<ShardRegistry>, settings: AggregatorConfig) -> Self {
        let executor = ShardQueryExecutor::new(Duration::from_millis(settings.shard_timeout_ms));
        Self {
            registry,
            settings,
            executor,
            resolver: HierarchyResolver::new(executor),
        }
    }

    pub fn registry(&self) -> &ShardRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &AggregatorConfig {
        &self.settings
    }

    /// Validate an inbound request, assemble the page, and shape the response.
    pub async fn list_subjects(&self, request: &SubjectListRequest) -> Result<SubjectListResponse> {
        let page_request = request.validate(&self.registry, &self.settings)?;
        let page = self.get_page(&page_request).await?;
        Ok(SubjectListResponse::from(page))
    }

    /// Resolve the actor's accessible set against their own shard.
    pub async fn resolve_access(&self, actor: &Actor) -> Result<AccessibleSet> {
        let shard = self.registry.get(&actor.shard)?;
        self.resolver.resolve(actor, shard).await
    }

    /// Assemble one global page.
    pub async fn get_page(&self, request: &PageRequest) -> Result<GlobalPage> {
        self.check(request)?;

        let mut degraded = Vec::new();
        let plans = self.plan_shards(request, &mut degraded).await?;

        // Count phase
        let counts = self.count_all(request, &plans, &mut degraded).await;
        let total_count: u64 = counts.iter().sum();
        let total_pages = page_count(total_count, request.per_page);
        let global_offset = request.global_offset();

        let slices = plan_window(&counts, global_offset, request.per_page);
        debug!(
            "Window offset={} per_page={} total={} over {} shard(s): {:?}",
            global_offset,
            request.per_page,
            total_count,
            plans.len(),
            slices
        );

        // Fetch phase
        let items = self.fetch_all(request, &plans, &slices).await?;

        info!(
            "Page {} for '{}': {} item(s), total {}, {} degraded shard(s)",
            request.page,
            request.actor.id,
            items.len(),
            total_count,
            degraded.len()
        );

        Ok(GlobalPage {
            items,
            page: request.page,
            per_page: request.per_page,
            total_count,
            total_pages,
            degraded_shards: degraded,
        })
    }

    /// Reject malformed requests before any shard is contacted.
    fn check(&self, request: &PageRequest) -> Result<()> {
        self.registry.get(&request.actor.shard)?;
        if let Some(ref key) = request.shard_filter {
            self.registry.get(key)?;
        }
        if request.page == 0 {
            return Err(AccessError::invalid_filter("page", "must be at least 1"));
        }
        if request.per_page == 0 {
            return Err(AccessError::invalid_filter("per_page", "must be at least 1"));
        }
        Ok(())
    }

    /// Decide, per eligible shard in declared order, whether and how to query it.
    async fn plan_shards<'a>(
        &'a self,
        request: &PageRequest,
        degraded: &mut Vec<DegradedShard>,
    ) -> Result<Vec<(&'a RegisteredShard, ShardPlan)>> {
        let actor = &request.actor;
        let eligible: Vec<&RegisteredShard> = self
            .registry
            .iter()
            .filter(|s| request.shard_filter.as_deref().is_none_or(|k| s.key() == k))
            .collect();

        let skip_all = |eligible: Vec<&'a RegisteredShard>| {
            eligible
                .into_iter()
                .map(|s| (s, ShardPlan::Skip))
                .collect::<Vec<_>>()
        };

        let scope = actor.roles.scope();
        match scope {
            RoleScope::All => {
                return Ok(eligible
                    .into_iter()
                    .map(|s| (s, ShardPlan::Query(AccessRestriction::Unrestricted)))
                    .collect())
            }
            RoleScope::NoAccess => {
                debug!("Actor '{}' has no listing role", actor.id);
                return Ok(skip_all(eligible));
            }
            RoleScope::Manager | RoleScope::Superior => {}
        }

        let own_eligible = eligible.iter().any(|s| s.key() == actor.shard);
        if !own_eligible && self.settings.foreign_shards == ForeignShardPolicy::Exclude {
            debug!(
                "Actor '{}' is scoped to shard '{}', which is not selected",
                actor.id, actor.shard
            );
            return Ok(skip_all(eligible));
        }

        let own_shard = self.registry.get(&actor.shard)?;
        let own_plan = match self.resolver.resolve(actor, own_shard).await {
            Ok(AccessibleSet::All) => {
                return Ok(eligible
                    .into_iter()
                    .map(|s| (s, ShardPlan::Query(AccessRestriction::Unrestricted)))
                    .collect())
            }
            Ok(set) if set.is_empty() => {
                // No assignees: nothing anywhere, not everything everywhere
                debug!("Actor '{}' has no delegated subjects", actor.id);
                return Ok(skip_all(eligible));
            }
            Ok(set) => ShardPlan::Query(AccessRestriction::from(&set)),
            Err(e @ AccessError::HierarchyUnavailable { .. }) => {
                if self.settings.hierarchy_fallback == HierarchyFallback::Fail {
                    return Err(e);
                }
                warn!("Degrading shard '{}': {}", actor.shard, e);
                degraded.push(DegradedShard {
                    shard: actor.shard.clone(),
                    reason: e.to_string(),
                });
                // Whether the actor has any assignee is unknown, so foreign
                // shards are withheld as well
                return Ok(skip_all(eligible));
            }
            Err(e) => return Err(e),
        };

        Ok(eligible
            .into_iter()
            .map(|s| {
                let plan = if s.key() == actor.shard {
                    own_plan.clone()
                } else {
                    match self.settings.foreign_shards {
                        ForeignShardPolicy::Exclude => ShardPlan::Skip,
                        ForeignShardPolicy::Unrestricted => {
                            ShardPlan::Query(AccessRestriction::Unrestricted)
                        }
                    }
                };
                (s, plan)
            })
            .collect())
    }

    /// Count every planned shard concurrently. Failures count as zero and are
    /// recorded as degraded.
    async fn count_all(
        &self,
        request: &PageRequest,
        plans: &[(&RegisteredShard, ShardPlan)],
        degraded: &mut Vec<DegradedShard>,
    ) -> Vec<u64> {
        let futures = plans.iter().map(|(shard, plan)| async move {
            match plan {
                ShardPlan::Skip => Ok(0),
                ShardPlan::Query(restriction) => {
                    self.executor
                        .count(shard, &request.filter, restriction)
                        .await
                }
            }
        });

        let results = join_all(futures).await;

        plans
            .iter()
            .zip(results)
            .map(|((shard, _), result)| match result {
                Ok(count) => {
                    debug!("Shard '{}': {} matching", shard.key(), count);
                    count
                }
                Err(e) => {
                    warn!("Skipping shard '{}' in count: {}", shard.key(), e);
                    degraded.push(DegradedShard {
                        shard: shard.key().to_string(),
                        reason: e.to_string(),
                    });
                    0
                }
            })
            .collect()
    }

    /// Fetch the planned slices concurrently and stitch them in shard order.
    async fn fetch_all(
        &self,
        request: &PageRequest,
        plans: &[(&RegisteredShard, ShardPlan)],
        slices: &[WindowSlice],
    ) -> Result<Vec<ShardSubject>> {
        let futures = slices.iter().filter_map(|slice| {
            let (shard, plan) = &plans[slice.index];
            let ShardPlan::Query(restriction) = plan else {
                return None;
            };
            Some(async move {
                let mut rows = self
                    .executor
                    .fetch_page(
                        shard,
                        &request.filter,
                        restriction,
                        slice.local_offset,
                        slice.local_limit,
                    )
                    .await
                    .map_err(|e| {
                        warn!("Fetch from shard '{}' failed: {}", shard.key(), e);
                        AccessError::partial_fetch(shard.key(), e.to_string())
                    })?;

                let expected = slice.local_limit as usize;
                if rows.len() < expected {
                    warn!(
                        "Shard '{}' returned {} of {} planned row(s); it changed since counting",
                        shard.key(),
                        rows.len(),
                        expected
                    );
                }
                rows.truncate(expected);

                Ok::<_, AccessError>(
                    rows.into_iter()
                        .map(|subject| ShardSubject {
                            shard_key: shard.info.key.clone(),
                            shard_name: shard.info.name.clone(),
                            subject,
                        })
                        .collect::<Vec<_>>(),
                )
            })
        });

        // The first failure drops the remaining in-flight fetches
        let chunks = try_join_all(futures).await?;
        Ok(chunks.into_iter().flatten().collect())
    }
}
