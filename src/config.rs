//! Project configuration.
//!
//! Every project has a `config.toml` at its root, written by `gensite init`:
//!
//! ```toml
//! # Where the project lives. Relative paths resolve against this file.
//! project_directory = "/home/me/blog"
//!
//! # Requested theme. Looked up as `templates/<theme>/`, falling back to
//! # `templates/themes/<theme>/` when missing.
//! theme = "default"
//!
//! # Informational only.
//! project_name = "My blog"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the project configuration.
pub const CONFIG_FILE: &str = "config.toml";

/// Theme used when the config does not name one.
pub const DEFAULT_THEME: &str = "default";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("'{}' not found; run the command from the project root", .0.display())]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Project configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Root of the project holding `content/`, `publish/` and `templates/`.
    #[serde(default)]
    pub project_directory: PathBuf,
    /// Requested theme, also the fallback name under `templates/themes/`.
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Display name chosen at `init` time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Parallel rendering settings.
    #[serde(default)]
    pub processing: ProcessingConfig,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

impl ProjectConfig {
    pub fn new(project_directory: impl Into<PathBuf>) -> Self {
        Self {
            project_directory: project_directory.into(),
            theme: default_theme(),
            project_name: None,
            processing: ProcessingConfig::default(),
        }
    }

    /// Check required fields are present and usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "missing 'project_directory' in '{CONFIG_FILE}'"
            )));
        }
        if self.theme.trim().is_empty() {
            return Err(ConfigError::Invalid("'theme' must not be empty".into()));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Invalid(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn content_dir(&self) -> PathBuf {
        self.project_directory.join("content")
    }

    pub fn publish_dir(&self) -> PathBuf {
        self.project_directory.join("publish")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.project_directory.join("templates")
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of documents rendered at once.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Load `config.toml` from `dir`.
///
/// A relative `project_directory` is resolved against `dir`.
pub fn load_config(dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    if !path.is_file() {
        return Err(ConfigError::NotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    let mut config: ProjectConfig = toml::from_str(&content)?;
    config.validate()?;
    if config.project_directory.is_relative() {
        config.project_directory = dir.join(&config.project_directory);
    }
    Ok(config)
}

/// Serialize a config the way `init` writes it.
pub fn to_toml(config: &ProjectConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::Invalid(e.to_string()))
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# gensite project configuration
# =============================
# Place this file at the root of the project, next to content/, publish/
# and templates/.

# Root of the project. Relative paths resolve against this file's directory.
project_directory = "."

# Requested theme. Looked up as templates/<theme>/ first; when that
# directory is missing, templates/themes/<theme>/ is used instead.
theme = "default"

# Display name of the site (informational).
# project_name = "My site"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum documents rendered in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, body: &str) {
        fs::write(dir.join(CONFIG_FILE), body).unwrap();
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r#"
project_directory = "/srv/blog"
theme = "minimal"
project_name = "Blog"

[processing]
max_processes = 2
"#,
        );
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.project_directory, PathBuf::from("/srv/blog"));
        assert_eq!(config.theme, "minimal");
        assert_eq!(config.project_name.as_deref(), Some("Blog"));
        assert_eq!(config.processing.max_processes, Some(2));
    }

    #[test]
    fn theme_defaults_to_default() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), r#"project_directory = "/srv/blog""#);
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.theme, "default");
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn relative_project_directory_resolves_against_config_dir() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), r#"project_directory = ".""#);
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.project_directory, tmp.path().join("."));
        assert_eq!(config.content_dir(), tmp.path().join(".").join("content"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::NotFound(p)) if p == tmp.path().join(CONFIG_FILE)));
    }

    #[test]
    fn missing_project_directory_is_invalid() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), r#"theme = "default""#);
        let err = load_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("project_directory"));
    }

    #[test]
    fn empty_theme_is_invalid() {
        let mut config = ProjectConfig::new("/srv/blog");
        config.theme = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_workers_is_invalid() {
        let mut config = ProjectConfig::new("/srv/blog");
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "this is not valid toml [[[");
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r#"
project_directory = "/srv/blog"
theem = "typo"
"#,
        );
        let err = load_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn project_layout_paths() {
        let config = ProjectConfig::new("/srv/blog");
        assert_eq!(config.content_dir(), PathBuf::from("/srv/blog/content"));
        assert_eq!(config.publish_dir(), PathBuf::from("/srv/blog/publish"));
        assert_eq!(config.templates_dir(), PathBuf::from("/srv/blog/templates"));
    }

    #[test]
    fn to_toml_roundtrips() {
        let mut config = ProjectConfig::new("/srv/blog");
        config.project_name = Some("Blog".to_string());
        let text = to_toml(&config).unwrap();
        let back: ProjectConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn stock_config_toml_is_valid() {
        let config: ProjectConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config.theme, "default");
        assert_eq!(config.project_directory, PathBuf::from("."));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }
}
