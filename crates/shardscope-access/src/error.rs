//! Access error types.

use thiserror::Error;

/// Errors that can occur while resolving access or assembling a page.
#[derive(Error, Debug)]
pub enum AccessError {
    /// The delegation graph could not be read. Never means "no delegates".
    #[error("hierarchy unavailable on shard '{shard}': {message}")]
    HierarchyUnavailable { shard: String, message: String },

    /// A shard call failed
    #[error("shard '{shard}' unreachable: {message}")]
    ShardUnreachable { shard: String, message: String },

    /// A shard call did not finish within the per-shard timeout
    #[error("shard '{shard}' timed out after {timeout_ms}ms")]
    ShardTimeout { shard: String, timeout_ms: u64 },

    /// The caller named a shard that is not registered
    #[error("unknown shard key '{key}'")]
    InvalidShardKey { key: String },

    /// Malformed filter or paging input
    #[error("invalid {field}: {message}")]
    InvalidFilter { field: String, message: String },

    /// A counted shard failed while its slice of the page was being fetched
    #[error("partial result: fetch from shard '{shard}' failed: {message}")]
    PartialFetch { shard: String, message: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] shardscope_config::ConfigError),

    /// Store error outside of a shard call
    #[error("store error: {0}")]
    Store(#[from] shardscope_store::StoreError),

    /// Generic error with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl AccessError {
    /// Create a HierarchyUnavailable error.
    pub fn hierarchy_unavailable(shard: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HierarchyUnavailable {
            shard: shard.into(),
            message: message.into(),
        }
    }

    /// Create a ShardUnreachable error.
    pub fn shard_unreachable(shard: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ShardUnreachable {
            shard: shard.into(),
            message: message.into(),
        }
    }

    /// Create a ShardTimeout error.
    pub fn shard_timeout(shard: impl Into<String>, timeout_ms: u64) -> Self {
        Self::ShardTimeout {
            shard: shard.into(),
            timeout_ms,
        }
    }

    /// Create an InvalidShardKey error.
    pub fn invalid_shard_key(key: impl Into<String>) -> Self {
        Self::InvalidShardKey { key: key.into() }
    }

    /// Create an InvalidFilter error.
    pub fn invalid_filter(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a PartialFetch error.
    pub fn partial_fetch(shard: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PartialFetch {
            shard: shard.into(),
            message: message.into(),
        }
    }

    /// Add context to any error.
    pub fn with_context(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Whether the shard call failed or timed out.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::ShardUnreachable { .. } | Self::ShardTimeout { .. })
    }

    /// Whether a count-phase failure of this kind may be absorbed by
    /// treating the shard as empty and flagging it degraded.
    pub fn is_recoverable(&self) -> bool {
        self.is_unreachable() || matches!(self, Self::HierarchyUnavailable { .. })
    }

    /// Shard the error is attributed to, if any.
    pub fn shard(&self) -> Option<&str> {
        match self {
            Self::HierarchyUnavailable { shard, .. }
            | Self::ShardUnreachable { shard, .. }
            | Self::ShardTimeout { shard, .. }
            | Self::PartialFetch { shard, .. } => Some(shard),
            Self::InvalidShardKey { key } => Some(key),
            _ => None,
        }
    }
}
