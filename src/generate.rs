//! Batch HTML generation.
//!
//! A batch takes one content subtree (`content/articles/` or
//! `content/pages/`), renders every markdown file in it, and writes one HTML
//! file per document into the publish directory:
//!
//! ```text
//! content/articles/hello.md          ─▶  publish/hello.html
//! content/articles/2024/recap.md     ─▶  publish/recap.html
//! content/pages/about.md             ─▶  publish/about.html
//! templates/<theme>/static/**        ─▶  publish/static/**
//! ```
//!
//! Output names use only the file stem, so the publish directory is flat.
//! Two sources with the same stem write the same file; they are processed in
//! sorted path order and the last one wins, with a warning.
//!
//! ## Failure Handling
//!
//! A document with a missing or malformed header is recorded in the
//! [`GenerationReport`] and the batch moves on. Everything else (unreadable
//! files, a missing theme, a missing or broken template) aborts the batch,
//! since it points at the project setup rather than one document.
//!
//! ## Parallel Rendering
//!
//! Documents are rendered in parallel on a [rayon](https://docs.rs/rayon)
//! pool sized by `processing.max_processes`. The theme is resolved, its static
//! assets copied and its templates loaded before any document starts. A
//! [`CancelToken`] stops the batch from starting further documents; documents
//! already in flight finish, and every write goes through a temporary file
//! and a rename so no partial page is ever left behind.

use crate::config::{self, ConfigError, ProjectConfig};
use crate::frontmatter::{self, HeaderError};
use crate::render::{self, RenderError, Renderer, TemplateEngine};
use crate::theme::{self, ThemeError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extension of source documents.
pub const SOURCE_EXTENSION: &str = "md";

/// Subdirectory of `content/` holding articles.
pub const ARTICLES_DIR: &str = "articles";

/// Subdirectory of `content/` holding pages.
pub const PAGES_DIR: &str = "pages";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("'{}' directory was not found", .0.display())]
    MissingDirectory(PathBuf),
    #[error(transparent)]
    Theme(#[from] ThemeError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl GenerateError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Why a document was left out of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MissingHeader,
    MalformedHeader,
}

impl From<&HeaderError> for FailureKind {
    fn from(err: &HeaderError) -> Self {
        match err {
            HeaderError::Missing => FailureKind::MissingHeader,
            HeaderError::Malformed { .. } => FailureKind::MalformedHeader,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub detail: String,
}

/// Outcome of one batch.
///
/// `processed + failures.len() + skipped == discovered` always holds;
/// `skipped` is only non-zero when the batch was cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Subtree this batch walked.
    pub content_dir: PathBuf,
    /// Theme the batch asked for.
    pub requested_theme: String,
    /// Theme actually used.
    pub theme: String,
    /// The requested theme was missing and `templates/themes/<theme>` was used.
    pub fell_back: bool,
    pub discovered: usize,
    pub processed: usize,
    /// Documents not started because the batch was cancelled.
    pub skipped: usize,
    /// Sorted by path.
    pub failures: Vec<DocumentFailure>,
    /// Files written, sorted.
    pub outputs: Vec<PathBuf>,
}

impl GenerationReport {
    pub fn missing_header(&self) -> impl Iterator<Item = &DocumentFailure> {
        self.failures_of(FailureKind::MissingHeader)
    }

    pub fn malformed_header(&self) -> impl Iterator<Item = &DocumentFailure> {
        self.failures_of(FailureKind::MalformedHeader)
    }

    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &DocumentFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }
}

/// Shared flag that stops a batch from starting further documents.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum Outcome {
    Written(PathBuf),
    Failed(DocumentFailure),
    Skipped,
}

/// Renders content subtrees of one project.
#[derive(Debug, Clone)]
pub struct Generator {
    config: ProjectConfig,
    theme: String,
    cancel: CancelToken,
}

impl Generator {
    /// Check the project layout and prepare a generator for it.
    ///
    /// `content/` and `publish/` must exist under the project directory.
    pub fn new(config: ProjectConfig) -> Result<Self, GenerateError> {
        config.validate()?;
        for dir in [config.content_dir(), config.publish_dir()] {
            if !dir.is_dir() {
                return Err(GenerateError::MissingDirectory(dir));
            }
        }
        Ok(Self {
            theme: config.theme.clone(),
            config,
            cancel: CancelToken::new(),
        })
    }

    /// Load `config.toml` from `dir` and build a generator from it.
    pub fn from_dir(dir: &Path) -> Result<Self, GenerateError> {
        Self::new(config::load_config(dir)?)
    }

    /// Request a theme other than the configured one. The configured theme
    /// stays the fallback.
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Render `content/articles/` with [`Renderer::Article`].
    pub fn generate_articles(&self) -> Result<GenerationReport, GenerateError> {
        let dir = self.config.content_dir().join(ARTICLES_DIR);
        self.generate_all(&dir, |_| Renderer::Article)
    }

    /// Render `content/pages/` with [`Renderer::Page`].
    pub fn generate_pages(&self) -> Result<GenerationReport, GenerateError> {
        let dir = self.config.content_dir().join(PAGES_DIR);
        self.generate_all(&dir, |_| Renderer::Page)
    }

    /// Render every markdown file under `content_dir`.
    ///
    /// `renderer_for` picks the template strategy per source path. Header
    /// errors are collected into the report; any other error aborts the batch.
    /// A missing `content_dir` is an empty batch.
    pub fn generate_all<F>(
        &self,
        content_dir: &Path,
        renderer_for: F,
    ) -> Result<GenerationReport, GenerateError>
    where
        F: Fn(&Path) -> Renderer + Sync,
    {
        let publish_dir = self.config.publish_dir();
        let theme_dir =
            theme::resolve(&self.config.templates_dir(), &self.theme, &self.config.theme)?;
        theme::copy_static_assets(&theme_dir, &publish_dir)?;
        let engine = TemplateEngine::new(&theme_dir.path)?;

        let sources = discover_sources(content_dir)?;
        let groups = group_by_stem(&sources);
        info!(
            content = %content_dir.display(),
            theme = %theme_dir.name,
            documents = sources.len(),
            "generating"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config::effective_threads(&self.config.processing))
            .build()?;

        // Same-stem documents share a worker so their writes are ordered.
        let outcomes: Vec<Vec<Outcome>> = pool.install(|| {
            groups
                .par_iter()
                .map(|(stem, paths)| {
                    paths
                        .iter()
                        .map(|path| {
                            self.process_document(path, stem, renderer_for(path), &engine, &publish_dir)
                        })
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        let mut report = GenerationReport {
            content_dir: content_dir.to_path_buf(),
            requested_theme: self.theme.clone(),
            theme: theme_dir.name,
            fell_back: theme_dir.fell_back,
            discovered: sources.len(),
            ..Default::default()
        };
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Outcome::Written(path) => {
                    report.processed += 1;
                    report.outputs.push(path);
                }
                Outcome::Failed(failure) => report.failures.push(failure),
                Outcome::Skipped => report.skipped += 1,
            }
        }
        report.failures.sort_by(|a, b| a.path.cmp(&b.path));
        report.outputs.sort();
        report.outputs.dedup();

        info!(
            processed = report.processed,
            failed = report.failures.len(),
            skipped = report.skipped,
            "batch complete"
        );
        Ok(report)
    }

    fn process_document(
        &self,
        path: &Path,
        stem: &str,
        renderer: Renderer,
        engine: &TemplateEngine,
        publish_dir: &Path,
    ) -> Result<Outcome, GenerateError> {
        if self.cancel.is_cancelled() {
            return Ok(Outcome::Skipped);
        }

        let text = fs::read_to_string(path).map_err(GenerateError::io(path))?;
        let doc = match frontmatter::parse(&text) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(path = %path.display(), "skipping document: {err}");
                return Ok(Outcome::Failed(DocumentFailure {
                    path: path.to_path_buf(),
                    kind: FailureKind::from(&err),
                    detail: err.to_string(),
                }));
            }
        };

        let html = renderer.render(engine, path, doc)?;
        let output = publish_dir.join(format!("{stem}.html"));
        write_atomic(&output, &html)?;
        debug!(source = %path.display(), output = %output.display(), "generated");
        Ok(Outcome::Written(output))
    }
}

/// Every `*.md` file under `dir`, sorted by path. The extension match is
/// case-sensitive.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "content directory missing, nothing to generate");
        return Ok(Vec::new());
    }
    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| GenerateError::Io {
            path: e.path().unwrap_or(dir).to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && is_source(entry.path()) {
            sources.push(entry.into_path());
        }
    }
    sources.sort();
    Ok(sources)
}

fn is_source(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == SOURCE_EXTENSION)
}

/// Group sources by output stem, keeping sorted path order inside a group.
fn group_by_stem(sources: &[PathBuf]) -> Vec<(String, Vec<PathBuf>)> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in sources {
        groups
            .entry(render::file_stem(path))
            .or_default()
            .push(path.clone());
    }
    for (stem, paths) in &groups {
        if paths.len() > 1 {
            warn!(
                output = %format!("{stem}.html"),
                sources = ?paths,
                "several documents share an output name; the last one wins"
            );
        }
    }
    groups.into_iter().collect()
}

/// Write through a sibling temp file and rename it into place.
fn write_atomic(path: &Path, contents: &str) -> Result<(), GenerateError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp, contents).map_err(GenerateError::io(&tmp))?;
    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(GenerateError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}
