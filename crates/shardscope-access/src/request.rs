//! Inbound listing requests and outbound responses.
//!
//! The request mirrors what a handler layer receives from the outside; it is
//! validated into a [`PageRequest`] before any shard is contacted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use shardscope_config::AggregatorConfig;
use shardscope_store::SubjectFilter;

use crate::error::AccessError;
use crate::registry::ShardRegistry;
use crate::types::{Actor, DegradedShard, GlobalPage, PageRequest, RoleFlags, ShardSubject};
use crate::Result;

static KYC_STATUS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,32}$").expect("static kyc pattern"));

fn default_page() -> u64 {
    1
}

/// Subject listing request as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectListRequest {
    pub actor_id: String,
    /// Shard the actor lives in
    pub actor_shard: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_manager: bool,
    #[serde(default)]
    pub is_superior: bool,
    /// List a single shard only
    #[serde(default)]
    pub shard_filter: Option<String>,
    #[serde(default)]
    pub kyc_filter: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    /// Falls back to the configured default page size
    #[serde(default)]
    pub per_page: Option<u64>,
}

impl SubjectListRequest {
    /// Validate against the registry and limits.
    pub fn validate(
        &self,
        registry: &ShardRegistry,
        settings: &AggregatorConfig,
    ) -> Result<PageRequest> {
        let actor_id = self.actor_id.trim();
        if actor_id.is_empty() {
            return Err(AccessError::invalid_filter("actor_id", "must not be empty"));
        }
        registry.get(&self.actor_shard)?;

        let shard_filter = non_blank(&self.shard_filter);
        if let Some(ref key) = shard_filter {
            registry.get(key)?;
        }

        if self.page == 0 {
            return Err(AccessError::invalid_filter("page", "must be at least 1"));
        }

        let max = u64::from(settings.max_per_page);
        let per_page = self
            .per_page
            .unwrap_or(u64::from(settings.default_per_page));
        if per_page == 0 || per_page > max {
            return Err(AccessError::invalid_filter(
                "per_page",
                format!("must be between 1 and {}", max),
            ));
        }

        let mut filter = SubjectFilter::all();

        if let Some(search) = non_blank(&self.search) {
            if search.chars().count() > settings.max_search_len {
                return Err(AccessError::invalid_filter(
                    "search",
                    format!("longer than {} characters", settings.max_search_len),
                ));
            }
            if search.chars().any(char::is_control) {
                return Err(AccessError::invalid_filter(
                    "search",
                    "contains control characters",
                ));
            }
            filter.search = Some(search);
        }

        if let Some(status) = non_blank(&self.kyc_filter) {
            if !KYC_STATUS_PATTERN.is_match(&status) {
                return Err(AccessError::invalid_filter(
                    "kyc_filter",
                    format!("'{}' is not a valid status", status),
                ));
            }
            filter.kyc_status = Some(status);
        }

        Ok(PageRequest {
            actor: Actor::new(
                actor_id,
                self.actor_shard.clone(),
                RoleFlags::new(self.is_admin, self.is_manager, self.is_superior),
            ),
            filter,
            shard_filter,
            page: self.page,
            per_page,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total_count: u64,
    pub total_pages: u64,
}

/// Listing response: flat records annotated with their shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectListResponse {
    pub data: Vec<ShardSubject>,
    pub pagination: Pagination,
    pub degraded_shards: Vec<DegradedShard>,
    /// Some shard was left out of the totals
    pub partial: bool,
}

impl From<GlobalPage> for SubjectListResponse {
    fn from(page: GlobalPage) -> Self {
        let partial = page.is_partial();
        Self {
            data: page.items,
            pagination: Pagination {
                page: page.page,
                per_page: page.per_page,
                total_count: page.total_count,
                total_pages: page.total_pages,
            },
            degraded_shards: page.degraded_shards,
            partial,
        }
    }
}
