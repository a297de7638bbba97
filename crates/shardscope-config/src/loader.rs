//! Layered configuration lookup.
//!
//! Layers apply in order, later ones winning:
//! 1. `~/.shardscope/config.toml`
//! 2. `.shardscope/config.toml` under the working directory
//! 3. [`ConfigOverrides`] from the command line
//!
//! An explicit file given to [`ConfigLoader::load_file`] stands in for the
//! first two layers.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{ConfigError, IoOp};
use crate::{AggregatorConfig, ConfigOverrides, LoggingConfig, ShardscopeConfig};

const FILE_NAME: &str = "config.toml";
const DIR_NAME: &str = ".shardscope";

/// A configuration file and the role it plays in the lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfigLayer {
    Global(PathBuf),
    Local(PathBuf),
    Explicit(PathBuf),
}

impl ConfigLayer {
    fn path(&self) -> &Path {
        match self {
            Self::Global(p) | Self::Local(p) | Self::Explicit(p) => p,
        }
    }
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self {
            Self::Global(_) => "global",
            Self::Local(_) => "local",
            Self::Explicit(_) => "explicit",
        };
        write!(f, "{} config {}", role, self.path().display())
    }
}

/// Resolves the effective [`ShardscopeConfig`] from disk.
///
/// The global layer is read once and cached; call [`clear_cache`](Self::clear_cache)
/// after editing it.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Directory holding the global file, `None` without a home directory
    global_dir: Option<PathBuf>,
    global_config: Option<ShardscopeConfig>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            global_dir: dirs::home_dir().map(|home| home.join(DIR_NAME)),
            global_config: None,
        }
    }

    /// Use `global_dir` in place of `~/.shardscope`.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_dir.as_ref().map(|dir| dir.join(FILE_NAME))
    }

    pub fn local_config_path(&self, root: &Path) -> PathBuf {
        root.join(DIR_NAME).join(FILE_NAME)
    }

    /// Merge global, local, and `overrides`, then validate the result.
    pub fn load(
        &mut self,
        root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<ShardscopeConfig, ConfigError> {
        let mut config = ShardscopeConfig::default();
        if let Some(global) = self.load_global()? {
            config = overlay(config, global);
        }
        if let Some(local) = self.load_local(root)? {
            config = overlay(config, local);
        }
        finish(config, overrides)
    }

    /// Read one explicit file, skipping the global and local layers.
    ///
    /// Unlike the other layers, a missing explicit file is an error.
    pub fn load_file(
        &self,
        path: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<ShardscopeConfig, ConfigError> {
        let layer = ConfigLayer::Explicit(path.to_path_buf());
        let config = read(layer.path())?;
        debug!("Loaded {}", layer);
        finish(config, overrides)
    }

    pub fn load_global(&mut self) -> Result<Option<ShardscopeConfig>, ConfigError> {
        if let Some(ref cached) = self.global_config {
            return Ok(Some(cached.clone()));
        }
        let Some(path) = self.global_config_path() else {
            debug!("No home directory; global config skipped");
            return Ok(None);
        };

        let config = read_optional(&ConfigLayer::Global(path))?;
        self.global_config.clone_from(&config);
        Ok(config)
    }

    pub fn load_local(&self, root: &Path) -> Result<Option<ShardscopeConfig>, ConfigError> {
        read_optional(&ConfigLayer::Local(self.local_config_path(root)))
    }

    pub fn save_global(&self, config: &ShardscopeConfig) -> Result<(), ConfigError> {
        let path = self.global_config_path().ok_or(ConfigError::NoHomeDir)?;
        write(&path, config)
    }

    pub fn save_local(&self, root: &Path, config: &ShardscopeConfig) -> Result<(), ConfigError> {
        write(&self.local_config_path(root), config)
    }

    /// Write a default global config unless one exists. Returns its path.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let path = self.global_config_path().ok_or(ConfigError::NoHomeDir)?;
        init(path)
    }

    /// Write a default local config under `root` unless one exists. Returns its path.
    pub fn init_local(&self, root: &Path) -> Result<PathBuf, ConfigError> {
        init(self.local_config_path(root))
    }

    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn finish(
    mut config: ShardscopeConfig,
    overrides: Option<&ConfigOverrides>,
) -> Result<ShardscopeConfig, ConfigError> {
    if let Some(overrides) = overrides {
        config.apply_overrides(overrides);
    }
    config.validate()?;
    Ok(config)
}

fn init(path: PathBuf) -> Result<PathBuf, ConfigError> {
    if !path.exists() {
        write(&path, &ShardscopeConfig::default())?;
        debug!("Created {}", path.display());
    }
    Ok(path)
}

fn read(path: &Path) -> Result<ShardscopeConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::io(IoOp::Read, path, e))?;
    toml::from_str(&text).map_err(|e| ConfigError::parse(path, e))
}

/// Read a layer that may legitimately be absent.
fn read_optional(layer: &ConfigLayer) -> Result<Option<ShardscopeConfig>, ConfigError> {
    match read(layer.path()) {
        Ok(config) => {
            debug!("Loaded {}", layer);
            Ok(Some(config))
        }
        Err(e) if e.is_not_found() => {
            trace!("No {}", layer);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn write(path: &Path, config: &ShardscopeConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| ConfigError::io(IoOp::CreateDir, dir, e))?;
    }
    let text = toml::to_string_pretty(config)?;
    fs::write(path, text).map_err(|e| ConfigError::io(IoOp::Write, path, e))
}

/// `top` if it was set away from `default`, otherwise `base`.
fn pick<T: PartialEq>(base: T, top: T, default: &T) -> T {
    if top != *default {
        top
    } else {
        base
    }
}

/// Lay `top` over `base`.
///
/// The shard list is ordered, so a non-empty list in `top` replaces the base
/// list whole instead of being interleaved with it.
fn overlay(base: ShardscopeConfig, top: ShardscopeConfig) -> ShardscopeConfig {
    let agg = AggregatorConfig::default();
    let log = LoggingConfig::default();

    ShardscopeConfig {
        shards: if top.shards.is_empty() {
            base.shards
        } else {
            top.shards
        },
        aggregator: AggregatorConfig {
            shard_timeout_ms: pick(
                base.aggregator.shard_timeout_ms,
                top.aggregator.shard_timeout_ms,
                &agg.shard_timeout_ms,
            ),
            default_per_page: pick(
                base.aggregator.default_per_page,
                top.aggregator.default_per_page,
                &agg.default_per_page,
            ),
            max_per_page: pick(
                base.aggregator.max_per_page,
                top.aggregator.max_per_page,
                &agg.max_per_page,
            ),
            max_search_len: pick(
                base.aggregator.max_search_len,
                top.aggregator.max_search_len,
                &agg.max_search_len,
            ),
            hierarchy_fallback: pick(
                base.aggregator.hierarchy_fallback,
                top.aggregator.hierarchy_fallback,
                &agg.hierarchy_fallback,
            ),
            foreign_shards: pick(
                base.aggregator.foreign_shards,
                top.aggregator.foreign_shards,
                &agg.foreign_shards,
            ),
        },
        logging: LoggingConfig {
            level: pick(base.logging.level, top.logging.level, &log.level),
            format: pick(base.logging.format, top.logging.format, &log.format),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ForeignShardPolicy, HierarchyFallback, LogFormat, ShardConfig};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// Workspace root plus a loader whose global dir lives beside it.
    fn fixture() -> (TempDir, ConfigLoader) {
        let temp = TempDir::new().unwrap();
        let loader = ConfigLoader::with_global_dir(temp.path().join("home"));
        (temp, loader)
    }

    fn put(path: PathBuf, toml: &str) -> PathBuf {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, toml).unwrap();
        path
    }

    fn put_local(loader: &ConfigLoader, root: &Path, toml: &str) -> PathBuf {
        put(loader.local_config_path(root), toml)
    }

    fn put_global(loader: &ConfigLoader, toml: &str) -> PathBuf {
        put(loader.global_config_path().unwrap(), toml)
    }

    #[test]
    fn test_no_files_gives_defaults() {
        let (temp, mut loader) = fixture();
        let config = loader.load(temp.path(), None).unwrap();

        assert!(config.shards.is_empty());
        assert_eq!(config.aggregator, AggregatorConfig::default());
    }

    #[test]
    fn test_local_layer() {
        let (temp, mut loader) = fixture();
        put_local(
            &loader,
            temp.path(),
            r#"
            [[shards]]
            key = "north"
            name = "North"
            path = "/data/north.db"
            read_only = true

            [aggregator]
            shard_timeout_ms = 750
            "#,
        );

        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config.shards.len(), 1);
        assert!(config.shards[0].read_only);
        assert_eq!(config.shards[0].path, PathBuf::from("/data/north.db"));
        assert_eq!(config.aggregator.shard_timeout_ms, 750);
    }

    #[test]
    fn test_local_shard_list_replaces_global() {
        let (temp, mut loader) = fixture();
        put_global(
            &loader,
            r#"
            [[shards]]
            key = "a"
            name = "A"
            path = "/a.db"

            [[shards]]
            key = "b"
            name = "B"
            path = "/b.db"

            [logging]
            level = "debug"
            format = "json"

            [aggregator]
            hierarchy_fallback = "fail"
            "#,
        );
        put_local(
            &loader,
            temp.path(),
            r#"
            [[shards]]
            key = "c"
            name = "C"
            path = "/c.db"

            [aggregator]
            foreign_shards = "unrestricted"
            "#,
        );

        let config = loader.load(temp.path(), None).unwrap();

        let keys: Vec<_> = config.shards.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["c"]);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.aggregator.hierarchy_fallback, HierarchyFallback::Fail);
        assert_eq!(
            config.aggregator.foreign_shards,
            ForeignShardPolicy::Unrestricted
        );
    }

    #[test]
    fn test_global_shards_kept_when_local_has_none() {
        let (temp, mut loader) = fixture();
        put_global(
            &loader,
            r#"
            [[shards]]
            key = "g"
            name = "G"
            path = "/g.db"
            "#,
        );
        put_local(&loader, temp.path(), "[aggregator]\nmax_per_page = 40\n");

        let config = loader.load(temp.path(), None).unwrap();
        assert_eq!(config.shards[0].key, "g");
        assert_eq!(config.aggregator.max_per_page, 40);
    }

    #[test]
    fn test_overrides_win() {
        let (temp, mut loader) = fixture();
        put_local(&loader, temp.path(), "[aggregator]\nshard_timeout_ms = 750\n");

        let overrides = ConfigOverrides {
            shard_timeout_ms: Some(100),
            hierarchy_fallback: Some(HierarchyFallback::Fail),
            log_level: Some("trace".to_string()),
            ..Default::default()
        };
        let config = loader.load(temp.path(), Some(&overrides)).unwrap();

        assert_eq!(config.aggregator.shard_timeout_ms, 100);
        assert_eq!(config.aggregator.hierarchy_fallback, HierarchyFallback::Fail);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_merged_result_is_validated() {
        let (temp, mut loader) = fixture();
        put_local(
            &loader,
            temp.path(),
            r#"
            [[shards]]
            key = "dup"
            name = "One"
            path = "/1.db"

            [[shards]]
            key = "dup"
            name = "Two"
            path = "/2.db"
            "#,
        );

        let err = loader.load(temp.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateShard { .. }));
    }

    #[test]
    fn test_explicit_file() {
        let (temp, loader) = fixture();
        put_global(&loader, "[aggregator]\nmax_per_page = 7\n");
        let path = put(
            temp.path().join("custom.toml"),
            r#"
            [[shards]]
            key = "only"
            name = "Only"
            path = "/only.db"
            "#,
        );

        let config = loader.load_file(&path, None).unwrap();
        assert_eq!(config.shards[0].key, "only");
        // Global layer is not consulted
        assert_eq!(config.aggregator.max_per_page, 100);

        let missing = loader
            .load_file(&temp.path().join("missing.toml"), None)
            .unwrap_err();
        assert!(missing.is_not_found());
    }

    #[test]
    fn test_parse_error_names_file() {
        let (temp, mut loader) = fixture();
        let path = put_local(&loader, temp.path(), "[[shards]\nkey = ");

        let err = loader.load(temp.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_save_then_load() {
        let (temp, loader) = fixture();
        let mut config = ShardscopeConfig::default();
        config
            .shards
            .push(ShardConfig::new("saved", "Saved", "/saved.db"));
        config.logging.level = "warn".to_string();

        loader.save_local(temp.path(), &config).unwrap();

        let loaded = loader.load_local(temp.path()).unwrap().unwrap();
        assert_eq!(loaded.shards, config.shards);
        assert_eq!(loaded.logging.level, "warn");
    }

    #[test]
    fn test_init_is_idempotent() {
        let (temp, loader) = fixture();

        let path = loader.init_local(temp.path()).unwrap();
        assert!(path.ends_with(".shardscope/config.toml"));
        let parsed: ShardscopeConfig = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed.shards.is_empty());

        fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();
        loader.init_local(temp.path()).unwrap();
        let kept = fs::read_to_string(&path).unwrap();
        assert!(kept.contains("warn"));

        let global = loader.init_global().unwrap();
        assert_eq!(Some(global), loader.global_config_path());
    }

    #[test]
    fn test_global_cache() {
        let (_temp, mut loader) = fixture();
        let path = put_global(&loader, "[logging]\nlevel = \"debug\"\n");

        assert_eq!(loader.load_global().unwrap().unwrap().logging.level, "debug");

        fs::write(&path, "[logging]\nlevel = \"error\"\n").unwrap();
        assert_eq!(loader.load_global().unwrap().unwrap().logging.level, "debug");

        loader.clear_cache();
        assert_eq!(loader.load_global().unwrap().unwrap().logging.level, "error");
    }

    #[test]
    fn test_no_home_dir() {
        let loader = ConfigLoader {
            global_dir: None,
            global_config: None,
        };
        assert!(matches!(
            loader.save_global(&ShardscopeConfig::default()),
            Err(ConfigError::NoHomeDir)
        ));
        assert!(loader.global_config_path().is_none());
    }
}
