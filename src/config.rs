//! Environment-driven configuration for the binaries.
//!
//! | Variable                      | Default          |
//! |-------------------------------|------------------|
//! | `CHURNSCOPE_MODEL_PATH`       | `models`         |
//! | `CHURNSCOPE_REQUIRE_MANIFEST` | `false`          |
//! | `CHURNSCOPE_LOG_MODE`         | `auto` (stderr)  |
//! | `CHURNSCOPE_LOG_FILE`         | `churnscope.log` |

use std::path::PathBuf;

use crate::adapters::ModelSource;

pub const MODEL_PATH_ENV: &str = "CHURNSCOPE_MODEL_PATH";
pub const REQUIRE_MANIFEST_ENV: &str = "CHURNSCOPE_REQUIRE_MANIFEST";
pub const LOG_MODE_ENV: &str = "CHURNSCOPE_LOG_MODE";
pub const LOG_FILE_ENV: &str = "CHURNSCOPE_LOG_FILE";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Stderr,
    Stdout,
    File,
}

impl LogMode {
    /// Parse a mode name; `auto` and unknown values fall back to stderr so
    /// stdout stays clean for JSON results.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "stdout" => Self::Stdout,
            "file" => Self::File,
            _ => Self::Stderr,
        }
    }
}

/// Settings read once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorerConfig {
    pub model_path: PathBuf,
    pub require_manifest: bool,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models"),
            require_manifest: false,
            log_mode: LogMode::Stderr,
            log_file: PathBuf::from("churnscope.log"),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

impl ScorerConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            model_path: lookup(MODEL_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            require_manifest: lookup(REQUIRE_MANIFEST_ENV)
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.require_manifest),
            log_mode: lookup(LOG_MODE_ENV)
                .map(|v| LogMode::parse(&v))
                .unwrap_or(defaults.log_mode),
            log_file: lookup(LOG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        }
    }

    /// The model source described by this configuration.
    #[must_use]
    pub fn model_source(&self) -> ModelSource {
        ModelSource::new(&self.model_path).require_manifest(self.require_manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = ScorerConfig::from_lookup(|_| None);
        assert_eq!(config, ScorerConfig::default());
    }

    #[test]
    fn test_reads_every_key() {
        let env: HashMap<&str, &str> = HashMap::from([
            (MODEL_PATH_ENV, "/srv/models/churn"),
            (REQUIRE_MANIFEST_ENV, "yes"),
            (LOG_MODE_ENV, "file"),
            (LOG_FILE_ENV, "/var/log/churn.log"),
        ]);
        let config = ScorerConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.model_path, PathBuf::from("/srv/models/churn"));
        assert!(config.require_manifest);
        assert_eq!(config.log_mode, LogMode::File);
        assert_eq!(config.log_file, PathBuf::from("/var/log/churn.log"));
        assert_eq!(config.model_source().path(), config.model_path.as_path());
    }

    #[test]
    fn test_log_mode_parse() {
        assert_eq!(LogMode::parse("auto"), LogMode::Stderr);
        assert_eq!(LogMode::parse("STDOUT"), LogMode::Stdout);
        assert_eq!(LogMode::parse(" file "), LogMode::File);
    }
}
