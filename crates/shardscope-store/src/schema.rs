//! SQLite Schema Definitions for Shard Storage
//!
//! Each shard is a self-contained SQLite database holding its own subjects
//! and its own delegation graph. No key space is shared between shards.

/// Schema version for shard databases
pub const SHARD_SCHEMA_VERSION: &str = "1.0";

/// SQL to create the subjects table
pub const SCHEMA_CREATE_SUBJECTS: &str = r#"
CREATE TABLE IF NOT EXISTS subjects (
    -- Shard-local identifier
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    email TEXT NOT NULL,

    -- KYC-like verification status
    kyc_status TEXT,

    -- Role flags
    is_admin INTEGER NOT NULL DEFAULT 0,
    is_manager INTEGER NOT NULL DEFAULT 0,
    is_superior_manager INTEGER NOT NULL DEFAULT 0,

    -- Seconds since the Unix epoch; drives listing order
    created_at INTEGER NOT NULL
)
"#;

/// SQL to create the delegation edge table
///
/// At most one edge per (superior, subordinate) pair. Cycles are not prevented.
pub const SCHEMA_CREATE_DELEGATION_EDGES: &str = r#"
CREATE TABLE IF NOT EXISTS delegation_edges (
    superior_id TEXT NOT NULL,
    subordinate_id TEXT NOT NULL,
    relationship_type TEXT NOT NULL
        CHECK (relationship_type IN ('manager_to_user', 'superior_manager_to_manager')),

    UNIQUE(superior_id, subordinate_id)
)
"#;

/// SQL to create indexes for efficient queries
pub const SCHEMA_CREATE_INDEXES: &str = r#"
-- Listing order
CREATE INDEX IF NOT EXISTS idx_subjects_created ON subjects(created_at DESC, id DESC);

-- KYC equality filter
CREATE INDEX IF NOT EXISTS idx_subjects_kyc ON subjects(kyc_status);

-- Delegation lookups by superior and type
CREATE INDEX IF NOT EXISTS idx_edges_superior_type ON delegation_edges(superior_id, relationship_type);
"#;

/// SQL to create the metadata table
pub const SCHEMA_CREATE_METADATA: &str = r#"
CREATE TABLE IF NOT EXISTS shard_metadata (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)
"#;

/// Column names for subject queries (in order for row mapping)
pub const SUBJECT_COLUMNS: &str =
    "id, name, email, kyc_status, is_admin, is_manager, is_superior_manager, created_at";

/// Column names for edge queries (in order for row mapping)
pub const EDGE_COLUMNS: &str = "superior_id, subordinate_id, relationship_type";
