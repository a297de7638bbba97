//! Shardscope configuration.
//!
//! Holds the shard directory, aggregation limits and policies, and logging
//! settings. See [`ConfigLoader`] for how files on disk are layered.

mod error;
mod loader;

pub use error::{ConfigError, IoOp};
pub use loader::ConfigLoader;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Allowed characters in a shard key.
static SHARD_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static shard key pattern"));

/// Root configuration for Shardscope.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShardscopeConfig {
    /// Shard directory, in iteration order
    pub shards: Vec<ShardConfig>,

    /// Cross-shard aggregation settings
    pub aggregator: AggregatorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// One independently provisioned data partition.
///
/// # Example TOML
///
/// ```toml
/// [[shards]]
/// key = "north"
/// name = "North Institution"
/// path = "/var/lib/shardscope/north.db"
/// read_only = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShardConfig {
    /// Stable shard key used in requests and responses
    pub key: String,

    /// Human-readable shard name
    pub name: String,

    /// Path to the shard's SQLite database
    pub path: PathBuf,

    /// Open the database read-only
    #[serde(default)]
    pub read_only: bool,
}

impl ShardConfig {
    /// Create a shard entry.
    pub fn new(key: impl Into<String>, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            path: path.into(),
            read_only: false,
        }
    }
}

/// Cross-shard aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Per-shard call timeout in milliseconds
    pub shard_timeout_ms: u64,

    /// Page size used when a request does not name one
    pub default_per_page: u32,

    /// Largest page size a request may ask for
    pub max_per_page: u32,

    /// Longest accepted free-text search, in characters
    pub max_search_len: usize,

    /// What to do when the delegation graph cannot be read
    pub hierarchy_fallback: HierarchyFallback,

    /// Whether scoped actors see shards other than their own
    pub foreign_shards: ForeignShardPolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            shard_timeout_ms: 5000,
            default_per_page: 20,
            max_per_page: 100,
            max_search_len: 200,
            hierarchy_fallback: HierarchyFallback::default(),
            foreign_shards: ForeignShardPolicy::default(),
        }
    }
}

/// Fallback when hierarchy resolution fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyFallback {
    /// The actor's own shard contributes nothing and is flagged degraded (default)
    #[default]
    Degrade,
    /// Return the error to the caller
    Fail,
}

impl std::fmt::Display for HierarchyFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Degrade => write!(f, "degrade"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl std::str::FromStr for HierarchyFallback {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "degrade" => Ok(Self::Degrade),
            "fail" => Ok(Self::Fail),
            _ => Err(ConfigError::unknown_variant(
                "hierarchy fallback",
                s,
                "degrade, fail",
            )),
        }
    }
}

/// Visibility of foreign shards for manager and superior-manager actors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ForeignShardPolicy {
    /// Scoped actors are served from their own shard only (default)
    #[default]
    Exclude,
    /// Other shards are queried with no access restriction
    Unrestricted,
}

impl std::fmt::Display for ForeignShardPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exclude => write!(f, "exclude"),
            Self::Unrestricted => write!(f, "unrestricted"),
        }
    }
}

impl std::str::FromStr for ForeignShardPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exclude" => Ok(Self::Exclude),
            "unrestricted" => Ok(Self::Unrestricted),
            _ => Err(ConfigError::unknown_variant(
                "foreign shard policy",
                s,
                "exclude, unrestricted",
            )),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::unknown_variant("log format", s, "text, json")),
        }
    }
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override per-shard timeout
    pub shard_timeout_ms: Option<u64>,

    /// Override default page size
    pub per_page: Option<u32>,

    /// Override hierarchy fallback
    pub hierarchy_fallback: Option<HierarchyFallback>,

    /// Override log level
    pub log_level: Option<String>,
}

impl ShardscopeConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(timeout) = overrides.shard_timeout_ms {
            self.aggregator.shard_timeout_ms = timeout;
        }

        if let Some(per_page) = overrides.per_page {
            self.aggregator.default_per_page = per_page;
        }

        if let Some(fallback) = overrides.hierarchy_fallback {
            self.aggregator.hierarchy_fallback = fallback;
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for shard in &self.shards {
            if !SHARD_KEY_PATTERN.is_match(&shard.key) {
                return Err(ConfigError::invalid_value(
                    "shards.key",
                    format!(
                        "'{}' must be non-empty and contain only letters, digits, '-' or '_'",
                        shard.key
                    ),
                ));
            }
            if !seen.insert(shard.key.as_str()) {
                return Err(ConfigError::duplicate_shard(&shard.key));
            }
        }

        let agg = &self.aggregator;
        if agg.shard_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "aggregator.shard_timeout_ms",
                "must be greater than zero",
            ));
        }
        if agg.max_per_page == 0 {
            return Err(ConfigError::invalid_value(
                "aggregator.max_per_page",
                "must be at least 1",
            ));
        }
        if agg.default_per_page == 0 || agg.default_per_page > agg.max_per_page {
            return Err(ConfigError::invalid_value(
                "aggregator.default_per_page",
                format!("must be between 1 and {}", agg.max_per_page),
            ));
        }

        Ok(())
    }

    /// Look up a shard by key.
    pub fn shard(&self, key: &str) -> Option<&ShardConfig> {
        self.shards.iter().find(|s| s.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_shards() -> ShardscopeConfig {
        ShardscopeConfig {
            shards: vec![
                ShardConfig::new("north", "North", "/data/north.db"),
                ShardConfig::new("south", "South", "/data/south.db"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = ShardscopeConfig::default();
        assert!(config.shards.is_empty());
        assert_eq!(config.aggregator.shard_timeout_ms, 5000);
        assert_eq!(config.aggregator.default_per_page, 20);
        assert_eq!(config.aggregator.max_per_page, 100);
        assert_eq!(
            config.aggregator.hierarchy_fallback,
            HierarchyFallback::Degrade
        );
        assert_eq!(config.aggregator.foreign_shards, ForeignShardPolicy::Exclude);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = ShardscopeConfig::default();
        let overrides = ConfigOverrides {
            shard_timeout_ms: Some(250),
            per_page: Some(50),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        config.apply_overrides(&overrides);

        assert_eq!(config.aggregator.shard_timeout_ms, 250);
        assert_eq!(config.aggregator.default_per_page, 50);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.aggregator.hierarchy_fallback,
            HierarchyFallback::Degrade
        );
    }

    #[test]
    fn test_validate_duplicate_shard_key() {
        let mut config = two_shards();
        config
            .shards
            .push(ShardConfig::new("north", "North again", "/data/n2.db"));

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateShard { ref key } if key == "north"));
    }

    #[test]
    fn test_validate_bad_shard_key() {
        let mut config = two_shards();
        config.shards[1].key = "south pole".to_string();
        assert!(config.validate().is_err());

        config.shards[1].key = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_page_sizes() {
        let mut config = two_shards();
        config.aggregator.default_per_page = 500;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_per_page"));

        config.aggregator.default_per_page = 10;
        config.aggregator.shard_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("shard_timeout_ms"));
    }

    #[test]
    fn test_shard_lookup_preserves_order() {
        let config = two_shards();
        assert_eq!(config.shard("south").map(|s| s.name.as_str()), Some("South"));
        assert!(config.shard("east").is_none());

        let keys: Vec<_> = config.shards.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["north", "south"]);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "fail".parse::<HierarchyFallback>().unwrap(),
            HierarchyFallback::Fail
        );
        assert_eq!(
            "DEGRADE".parse::<HierarchyFallback>().unwrap(),
            HierarchyFallback::Degrade
        );
        assert!("ignore".parse::<HierarchyFallback>().is_err());

        assert_eq!(
            "unrestricted".parse::<ForeignShardPolicy>().unwrap(),
            ForeignShardPolicy::Unrestricted
        );
        assert!("all".parse::<ForeignShardPolicy>().is_err());
        assert_eq!(ForeignShardPolicy::Exclude.to_string(), "exclude");

        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(ConfigError::UnknownVariant { setting: "log format", .. })
        ));
    }

    #[test]
    fn test_config_toml_roundtrip_keeps_shard_order() {
        let toml_str = r#"
            [[shards]]
            key = "zeta"
            name = "Zeta"
            path = "/z.db"

            [[shards]]
            key = "alpha"
            name = "Alpha"
            path = "/a.db"
            read_only = true

            [aggregator]
            foreign_shards = "unrestricted"
            hierarchy_fallback = "fail"
        "#;

        let config: ShardscopeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.shards[0].key, "zeta");
        assert_eq!(config.shards[1].key, "alpha");
        assert!(config.shards[1].read_only);
        assert_eq!(
            config.aggregator.foreign_shards,
            ForeignShardPolicy::Unrestricted
        );
        assert_eq!(config.aggregator.hierarchy_fallback, HierarchyFallback::Fail);
        // Unspecified aggregator fields keep their defaults
        assert_eq!(config.aggregator.max_per_page, 100);
    }
}
