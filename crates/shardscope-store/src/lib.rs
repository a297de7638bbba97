//! Shardscope Store - per-shard SQLite storage
//!
//! Every shard is an independent SQLite database holding the subjects that
//! live in that shard and the delegation edges between them. This crate is
//! synchronous; the access layer wraps it for concurrent use.
//!
//! ## Modules
//!
//! - [`model`]: Subjects, delegation edges, and filters
//! - [`schema`]: SQL schema for shard databases
//! - [`database`]: Connection wrapper with read and administrative operations
//! - [`error`]: Store error type

pub mod database;
pub mod error;
pub mod model;
pub mod schema;

pub use database::{ShardDatabase, ShardStats};
pub use error::StoreError;
pub use model::{DelegationEdge, RelationshipType, Subject, SubjectFilter, SubjectId};
pub use rusqlite::InterruptHandle;
pub use schema::SHARD_SCHEMA_VERSION;
