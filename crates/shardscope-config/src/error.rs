//! Errors raised while locating, reading, and checking configuration.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Filesystem step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read,
    Write,
    CreateDir,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::CreateDir => "create directory",
        })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot {op} '{path}': {source}")]
    Io {
        op: IoOp,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not fit the schema
    #[error("malformed config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot render config as TOML: {0}")]
    Render(#[from] toml::ser::Error),

    /// No home directory, so there is no global config location
    #[error("no home directory for the global config")]
    NoHomeDir,

    #[error("{key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Iteration order is keyed by shard, so keys must be unique
    #[error("shard '{key}' is declared more than once")]
    DuplicateShard { key: String },

    /// A policy or format string that names no known variant
    #[error("unknown {setting} '{value}' (expected one of: {expected})")]
    UnknownVariant {
        setting: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl ConfigError {
    pub fn io(op: IoOp, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn duplicate_shard(key: impl Into<String>) -> Self {
        Self::DuplicateShard { key: key.into() }
    }

    pub fn unknown_variant(
        setting: &'static str,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::UnknownVariant {
            setting,
            value: value.into(),
            expected,
        }
    }

    /// Whether the error came from a file that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_step_and_path() {
        let err = ConfigError::io(
            IoOp::CreateDir,
            "/etc/shardscope",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        let text = err.to_string();
        assert!(text.starts_with("cannot create directory '/etc/shardscope'"));
        assert!(!err.is_not_found());

        let missing = ConfigError::io(
            IoOp::Read,
            "/nope.toml",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(missing.is_not_found());
    }

    #[test]
    fn test_value_errors() {
        let err = ConfigError::invalid_value("aggregator.max_per_page", "must be at least 1");
        assert_eq!(err.to_string(), "aggregator.max_per_page: must be at least 1");

        let err = ConfigError::duplicate_shard("north");
        assert_eq!(err.to_string(), "shard 'north' is declared more than once");

        let err = ConfigError::unknown_variant("hierarchy fallback", "panic", "degrade, fail");
        assert_eq!(
            err.to_string(),
            "unknown hierarchy fallback 'panic' (expected one of: degrade, fail)"
        );
    }
}
