//! Shared types for access resolution and aggregation.

use serde::{Deserialize, Serialize};
use shardscope_store::{Subject, SubjectFilter, SubjectId};
use std::collections::BTreeSet;

/// Role flags handed over by the caller. Authentication happens upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFlags {
    pub is_admin: bool,
    pub is_manager: bool,
    pub is_superior: bool,
}

impl RoleFlags {
    pub fn new(is_admin: bool, is_manager: bool, is_superior: bool) -> Self {
        Self {
            is_admin,
            is_manager,
            is_superior,
        }
    }

    /// Administrator with no hierarchy role.
    pub fn admin() -> Self {
        Self::new(true, false, false)
    }

    /// Administrator acting as a manager.
    pub fn manager() -> Self {
        Self::new(true, true, false)
    }

    /// Administrator acting as a superior manager.
    pub fn superior() -> Self {
        Self::new(true, false, true)
    }

    /// Collapse the flags into a scope using the fixed precedence table:
    /// pure admin, then admin+manager, then admin+superior, then nothing.
    pub fn scope(&self) -> RoleScope {
        match (self.is_admin, self.is_manager, self.is_superior) {
            (true, false, false) => RoleScope::All,
            (true, true, false) => RoleScope::Manager,
            (true, _, true) => RoleScope::Superior,
            _ => RoleScope::NoAccess,
        }
    }
}

/// How an actor's visibility is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    /// Sees every subject in every shard
    All,
    /// Sees users reached through `manager_to_user` edges
    Manager,
    /// Sees managers and their users
    Superior,
    /// Sees nothing
    NoAccess,
}

/// The viewer of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Actor id, local to `shard`
    pub id: SubjectId,
    /// Key of the shard the actor lives in
    pub shard: String,
    pub roles: RoleFlags,
}

impl Actor {
    pub fn new(id: impl Into<SubjectId>, shard: impl Into<String>, roles: RoleFlags) -> Self {
        Self {
            id: id.into(),
            shard: shard.into(),
            roles,
        }
    }
}

/// Result of hierarchy resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "ids", rename_all = "snake_case")]
pub enum AccessibleSet {
    /// Every subject in every shard
    All,
    /// A finite, possibly empty set of ids in the actor's own shard
    Subjects(BTreeSet<SubjectId>),
}

impl AccessibleSet {
    pub fn empty() -> Self {
        Self::Subjects(BTreeSet::new())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// True only for a finite set with no members.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Subjects(ids) if ids.is_empty())
    }

    pub fn contains(&self, id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Subjects(ids) => ids.contains(id),
        }
    }

    /// Member count, `None` for the `All` sentinel.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::All => None,
            Self::Subjects(ids) => Some(ids.len()),
        }
    }
}

impl<I: Into<SubjectId>> FromIterator<I> for AccessibleSet {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self::Subjects(iter.into_iter().map(Into::into).collect())
    }
}

/// Per-shard restriction applied to count and fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRestriction {
    /// No restriction
    Unrestricted,
    /// Only subjects whose id is in the list
    Only(Vec<SubjectId>),
}

impl AccessRestriction {
    /// Ids to push down to the store, `None` when unrestricted.
    pub fn ids(&self) -> Option<&[SubjectId]> {
        match self {
            Self::Unrestricted => None,
            Self::Only(ids) => Some(ids),
        }
    }

    /// A finite empty restriction; such a shard is never contacted.
    pub fn is_empty_set(&self) -> bool {
        matches!(self, Self::Only(ids) if ids.is_empty())
    }
}

impl From<&AccessibleSet> for AccessRestriction {
    fn from(set: &AccessibleSet) -> Self {
        match set {
            AccessibleSet::All => Self::Unrestricted,
            AccessibleSet::Subjects(ids) => Self::Only(ids.iter().cloned().collect()),
        }
    }
}

/// Registered shard identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardInfo {
    pub key: String,
    pub name: String,
}

/// A subject tagged with its originating shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardSubject {
    pub shard_key: String,
    pub shard_name: String,
    #[serde(flatten)]
    pub subject: Subject,
}

/// A shard left out of a result, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedShard {
    pub shard: String,
    pub reason: String,
}

/// Validated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub actor: Actor,
    pub filter: SubjectFilter,
    /// Restrict the listing to one shard
    pub shard_filter: Option<String>,
    /// 1-based page number
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(actor: Actor, page: u64, per_page: u64) -> Self {
        Self {
            actor,
            filter: SubjectFilter::default(),
            shard_filter: None,
            page,
            per_page,
        }
    }

    pub fn with_filter(mut self, filter: SubjectFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_shard(mut self, key: impl Into<String>) -> Self {
        self.shard_filter = Some(key.into());
        self
    }

    /// Number of items that precede this page globally.
    pub fn global_offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// One page assembled from however many shards the window spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalPage {
    pub items: Vec<ShardSubject>,
    pub page: u64,
    pub per_page: u64,
    pub total_count: u64,
    pub total_pages: u64,
    /// Shards that contributed nothing because they could not be counted
    pub degraded_shards: Vec<DegradedShard>,
}

impl GlobalPage {
    /// Whether some shard was skipped while computing this page.
    pub fn is_partial(&self) -> bool {
        !self.degraded_shards.is_empty()
    }
}

/// Number of pages needed for `total` items.
pub fn page_count(total: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Health probe result for one shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardHealth {
    pub key: String,
    pub name: String,
    pub healthy: bool,
    pub message: Option<String>,
    pub latency_ms: u64,
}
