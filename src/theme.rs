//! Theme resolution and static asset publishing.
//!
//! A project's `templates/` directory holds one directory per theme. The
//! requested theme is looked up directly under the root; when it is absent
//! the configured default is tried under `templates/themes/`:
//!
//! ```text
//! templates/
//! ├── minimal/                   # requested theme, used as-is if present
//! │   ├── article_template.html
//! │   └── static/style.css
//! └── themes/
//!     └── default/               # fallback when the requested theme is missing
//!         ├── article_template.html
//!         ├── index_template.html
//!         └── static/
//! ```
//!
//! Resolution happens once per batch. The chosen theme's `static/` subtree is
//! then merged into `publish/static/` before any page is rendered.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory under the templates root that holds fallback themes.
pub const FALLBACK_THEMES_DIR: &str = "themes";

/// Directory inside a theme holding assets copied verbatim to the output.
pub const STATIC_DIR: &str = "static";

#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("templates directory not found: {0}")]
    TemplatesRootMissing(PathBuf),
    #[error("couldn't find theme '{requested}' and the fallback theme '{default}' is missing too")]
    ThemeNotFound { requested: String, default: String },
    #[error("failed to copy theme assets to {path}: {source}")]
    CopyAssets {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A theme located on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeDirectory {
    /// Effective theme name. Differs from the requested one after a fallback.
    pub name: String,
    /// Directory holding the theme's templates.
    pub path: PathBuf,
    /// Whether the requested theme was missing and the default was used.
    pub fell_back: bool,
}

impl ThemeDirectory {
    pub fn static_dir(&self) -> PathBuf {
        self.path.join(STATIC_DIR)
    }
}

/// Locate the template directory for `requested`, falling back to `default`.
///
/// Checks `templates_root/requested` first, then
/// `templates_root/themes/default`. A fallback is reported through a warning
/// and the [`ThemeDirectory::fell_back`] flag; it is never an error.
pub fn resolve(
    templates_root: &Path,
    requested: &str,
    default: &str,
) -> Result<ThemeDirectory, ThemeError> {
    if !templates_root.is_dir() {
        return Err(ThemeError::TemplatesRootMissing(templates_root.to_path_buf()));
    }

    let requested_dir = templates_root.join(requested);
    if requested_dir.is_dir() {
        return Ok(ThemeDirectory {
            name: requested.to_string(),
            path: requested_dir,
            fell_back: false,
        });
    }

    let default_dir = templates_root.join(FALLBACK_THEMES_DIR).join(default);
    if default_dir.is_dir() {
        warn!(
            requested,
            fallback = default,
            "couldn't find theme '{requested}', falling back to theme '{default}'"
        );
        return Ok(ThemeDirectory {
            name: default.to_string(),
            path: default_dir,
            fell_back: true,
        });
    }

    Err(ThemeError::ThemeNotFound {
        requested: requested.to_string(),
        default: default.to_string(),
    })
}

/// Merge the theme's `static/` subtree into `publish_dir/static`.
///
/// Files with the same relative path are overwritten; anything else already in
/// the destination is left alone. A theme without a `static/` directory copies
/// nothing. Returns the number of files copied.
pub fn copy_static_assets(theme: &ThemeDirectory, publish_dir: &Path) -> Result<usize, ThemeError> {
    let src = theme.static_dir();
    let dst = publish_dir.join(STATIC_DIR);
    if !src.is_dir() {
        debug!(theme = %theme.name, "theme has no static assets");
        return Ok(0);
    }
    let copied = copy_dir_merge(&src, &dst).map_err(|source| ThemeError::CopyAssets {
        path: dst.clone(),
        source,
    })?;
    debug!(theme = %theme.name, copied, dest = %dst.display(), "copied static assets");
    Ok(copied)
}

/// Recursively copy `src` into `dst`, overwriting same-path files only.
pub(crate) fn copy_dir_merge(src: &Path, dst: &Path) -> io::Result<usize> {
    fs::create_dir_all(dst)?;
    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
