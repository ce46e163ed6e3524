//! Project scaffolding for `gensite init`.
//!
//! Creates the directory layout the generator expects and a starter
//! `config.toml`:
//!
//! ```text
//! <project>/
//! ├── config.toml
//! ├── content/
//! │   ├── articles/
//! │   └── pages/
//! ├── publish/
//! └── templates/      # copied from the stock templates directory
//! ```
//!
//! The stock templates live outside the project (passed with `--templates` or
//! the `GEN_TEMPLATES` environment variable) so every new project starts from
//! the same themes.

use crate::config::{self, CONFIG_FILE, ConfigError, ProjectConfig};
use crate::generate::{ARTICLES_DIR, PAGES_DIR};
use crate::theme::copy_dir_merge;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("project directory not found: {}", .0.display())]
    ProjectDirectoryNotFound(PathBuf),
    #[error("stock templates directory not found: {}", .0.display())]
    TemplatesSourceMissing(PathBuf),
    #[error("project already initialized: {} exists", .0.display())]
    AlreadyInitialized(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Choices made when creating a project.
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub project_name: Option<String>,
    pub theme: String,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            project_name: None,
            theme: config::DEFAULT_THEME.to_string(),
        }
    }
}

/// Create a new project in `dir`, copying themes from `templates_source`.
///
/// `dir` must already exist. Fails without touching anything if the project
/// already has a `content/`, `publish/` or `config.toml`.
pub fn init_project(
    dir: &Path,
    templates_source: &Path,
    options: &InitOptions,
) -> Result<ProjectConfig, ScaffoldError> {
    if !dir.is_dir() {
        return Err(ScaffoldError::ProjectDirectoryNotFound(dir.to_path_buf()));
    }
    if !templates_source.is_dir() {
        return Err(ScaffoldError::TemplatesSourceMissing(
            templates_source.to_path_buf(),
        ));
    }
    let dir = dir.canonicalize()?;

    for existing in [
        dir.join("content"),
        dir.join("publish"),
        dir.join(CONFIG_FILE),
    ] {
        if existing.exists() {
            return Err(ScaffoldError::AlreadyInitialized(existing));
        }
    }

    let mut config = ProjectConfig::new(&dir);
    config.theme = options.theme.clone();
    config.project_name = options.project_name.clone();
    config.validate()?;

    for sub in [ARTICLES_DIR, PAGES_DIR] {
        fs::create_dir_all(config.content_dir().join(sub))?;
    }
    fs::create_dir_all(config.publish_dir())?;
    let copied = copy_dir_merge(templates_source, &config.templates_dir())?;
    fs::write(dir.join(CONFIG_FILE), config::to_toml(&config)?)?;

    info!(project = %dir.display(), templates = copied, "initialized project");
    Ok(config)
}

/// Re-copy the stock templates over an existing project's `templates/`.
///
/// Files the project added are kept; stock files are overwritten.
pub fn update_templates(dir: &Path, templates_source: &Path) -> Result<usize, ScaffoldError> {
    if !templates_source.is_dir() {
        return Err(ScaffoldError::TemplatesSourceMissing(
            templates_source.to_path_buf(),
        ));
    }
    let config = config::load_config(dir)?;
    let copied = copy_dir_merge(templates_source, &config.templates_dir())?;
    info!(project = %config.project_directory.display(), templates = copied, "updated templates");
    Ok(copied)
}
