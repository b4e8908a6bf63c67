//! dotsync configuration.
//!
//! Loaded from a TOML file. Only `paths.repo_root` is required; everything
//! else has sensible defaults resolved from platform directories.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Configuration loaded from `dotsync.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Filesystem layout.
    pub paths: PathsConfig,

    /// Sync behaviour options.
    #[serde(default)]
    pub options: OptionsConfig,
}

/// Where the template repository, the deployed files, and dotsync's own
/// data live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Template repository root.
    pub repo_root: PathBuf,

    /// Root the repository is deployed under. Defaults to the home
    /// directory.
    #[serde(default = "default_target_root")]
    pub target_root: PathBuf,

    /// Directory for backups and rollback scripts.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Sync behaviour options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Glob patterns excluded from sync, matched against repo-relative
    /// forward-slash paths.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Translate the leading path component to a dotted name when mapping
    /// repository paths to deployed paths (`bashrc` -> `.bashrc`).
    #[serde(default = "default_true")]
    pub dot_prefix: bool,

    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: default_ignore_patterns(),
            dot_prefix: default_true(),
            log_level: default_log_level(),
        }
    }
}

fn default_target_root() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("dotsync"))
        .unwrap_or_else(|| PathBuf::from(".dotsync"))
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        "**/*.bak".into(),
        "README*".into(),
        "LICENSE*".into(),
    ]
}

fn default_log_level() -> String {
    "info".into()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate constraints the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.paths.repo_root.is_dir() {
            return Err(ConfigError::InvalidValue {
                field: "paths.repo_root".into(),
                detail: format!("not a directory: {}", self.paths.repo_root.display()),
            });
        }
        match self.options.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "options.log_level".into(),
                    detail: format!("unknown level '{other}'"),
                });
            }
        }
        Ok(())
    }

    /// A starter config for `dotsync init`.
    pub fn starter(repo_root: &Path) -> Self {
        Self {
            paths: PathsConfig {
                repo_root: repo_root.to_path_buf(),
                target_root: default_target_root(),
                data_dir: default_data_dir(),
            },
            options: OptionsConfig::default(),
        }
    }

    /// Backup root under the data directory.
    pub fn backup_root(&self) -> PathBuf {
        self.paths.data_dir.join("backups")
    }

    /// Rollback script location for a pass started at `timestamp`.
    pub fn rollback_script_path(&self, timestamp: &str) -> PathBuf {
        self.paths.data_dir.join(format!("rollback-{timestamp}.sh"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let repo_root = dir.path().join("repo");
        fs::create_dir(&repo_root).unwrap();
        let config_path = dir.path().join("dotsync.toml");
        fs::write(
            &config_path,
            format!("[paths]\nrepo_root = \"{}\"\n", repo_root.display()),
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.paths.repo_root, repo_root);
        assert!(config.options.dot_prefix);
        assert_eq!(config.options.log_level, "info");
        assert!(!config.options.ignore_patterns.is_empty());
        assert!(config.backup_root().ends_with("backups"));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/no/such/dotsync.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo_root = dir.path().join("repo");
        fs::create_dir(&repo_root).unwrap();
        let config_path = dir.path().join("dotsync.toml");
        fs::write(
            &config_path,
            format!(
                "[paths]\nrepo_root = \"{}\"\n[options]\nlog_level = \"loud\"\n",
                repo_root.display()
            ),
        )
        .unwrap();

        let err = Config::load(&config_path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_missing_repo_root_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("dotsync.toml");
        fs::write(&config_path, "[paths]\nrepo_root = \"/no/such/repo\"\n").unwrap();

        let err = Config::load(&config_path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_starter_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let starter = Config::starter(dir.path());
        let body = toml::to_string_pretty(&starter).unwrap();
        let parsed: Config = toml::from_str(&body).unwrap();
        assert_eq!(parsed.paths.repo_root, dir.path());
        assert_eq!(parsed.options.dot_prefix, starter.options.dot_prefix);
    }

    #[test]
    fn test_rollback_script_path_is_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::starter(dir.path());
        let path = config.rollback_script_path("20250101000000");
        assert!(path.ends_with("rollback-20250101000000.sh"));
    }
}
