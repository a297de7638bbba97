//! Shardscope Access - hierarchical access resolution and cross-shard pagination
//!
//! This crate provides:
//! - Resolution of an actor's visible subjects from a per-shard delegation graph
//! - Concurrent, time-bounded count and fetch against independent shards
//! - Assembly of one global page without a global index
//!
//! ## Components
//!
//! - [`ShardRegistry`]: Fixed, ordered directory of shards
//! - [`ShardClient`]: Outbound data-access interface, implemented by
//!   [`SqliteShardClient`] and [`MemoryShardClient`]
//! - [`ShardQueryExecutor`]: Per-shard count/fetch with timeout
//! - [`HierarchyResolver`]: Bounded delegation traversal
//! - [`CrossShardAggregator`]: Fan-out, window planning, and stitching
//!
//! ## Example
//!
//! ```ignore
//! use shardscope_access::{CrossShardAggregator, ShardRegistry, SubjectListRequest};
//! use shardscope_config::ShardscopeConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config: ShardscopeConfig = toml::from_str(&std::fs::read_to_string("config.toml")?)?;
//!     let registry = Arc::new(ShardRegistry::from_config(&config)?);
//!     let aggregator = CrossShardAggregator::new(registry, config.aggregator.clone());
//!
//!     let response = aggregator
//!         .list_subjects(&SubjectListRequest {
//!             actor_id: "m-17".into(),
//!             actor_shard: "north".into(),
//!             is_admin: true,
//!             is_manager: true,
//!             page: 1,
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("{} of {}", response.data.len(), response.pagination.total_count);
//!     Ok(())
//! }
//! ```

mod aggregator;
mod error;
mod executor;
mod memory;
mod registry;
mod request;
mod resolver;
mod sqlite;
mod traits;
mod types;

pub use aggregator::{plan_window, CrossShardAggregator, WindowSlice};
pub use error::AccessError;
pub use executor::ShardQueryExecutor;
pub use memory::MemoryShardClient;
pub use registry::{RegisteredShard, ShardRegistry};
pub use request::{Pagination, SubjectListRequest, SubjectListResponse};
pub use resolver::{HierarchyResolver, DEFAULT_DELEGATION_HOPS, MAX_DELEGATION_HOPS};
pub use sqlite::SqliteShardClient;
pub use traits::ShardClient;
pub use types::*;

/// Result type for access operations.
pub type Result<T> = std::result::Result<T, AccessError>;
