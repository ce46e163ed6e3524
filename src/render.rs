//! Markdown conversion and template rendering.
//!
//! Rendering a document takes two steps:
//!
//! 1. The markdown body is converted to HTML with
//!    [pulldown-cmark](https://docs.rs/pulldown-cmark).
//! 2. The document is bound to a theme template through a [`TemplateEngine`],
//!    a [Tera](https://keats.github.io/tera/) instance loaded from the theme
//!    directory once per batch.
//!
//! ## Template Variables
//!
//! Every front matter key becomes a top-level variable holding its trimmed
//! value, and `content` holds the body HTML:
//!
//! ```text
//! ---                              <h1>{{ title }}</h1>
//! title: Hello          ──────▶    {{ content }}
//! ---
//! # Hi
//! ```
//!
//! Auto-escaping is off for every template: `content` is already HTML and is
//! inserted as-is. A header key literally named `content` is overwritten by
//! the body.
//!
//! ## Template Selection
//!
//! | Renderer | Template |
//! |----------|----------|
//! | [`Renderer::Article`] | `article_template.html` for every document |
//! | [`Renderer::Page`] | `<stem>_template.html`, so `about.md` uses `about_template.html` |
//!
//! A template with a syntax error, or one extending a template that cannot be
//! loaded, is set aside when the engine is built. Only documents that select
//! it fail.

use crate::frontmatter::ParsedDocument;
use crate::theme::STATIC_DIR;
use pulldown_cmark::{Parser, html as md_html};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error as _;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, ErrorKind, Tera};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Template used for every article.
pub const ARTICLE_TEMPLATE: &str = "article_template.html";

/// Suffix appended to a page's file stem to name its template.
pub const PAGE_TEMPLATE_SUFFIX: &str = "_template.html";

/// Template variable holding the rendered body.
pub const CONTENT_VAR: &str = "content";

const TEMPLATE_EXTENSION: &str = "html";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template '{name}' not found in {root}")]
    TemplateNotFound { name: String, root: PathBuf },
    #[error("failed to load templates from {root}: {detail}")]
    Load {
        root: PathBuf,
        detail: String,
        #[source]
        source: tera::Error,
    },
    #[error("failed to render template '{name}': {detail}")]
    Template {
        name: String,
        detail: String,
        #[source]
        source: tera::Error,
    },
    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to scan templates in {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Convert markdown to HTML.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    md_html::push_html(&mut html, parser);
    html
}

/// Build the variables a template sees for `doc`.
///
/// Metadata entries go in first, in header order, then `content` is set to the
/// body, overriding any header key of the same name.
pub fn template_context(doc: &ParsedDocument) -> Context {
    let mut context = Context::new();
    for (key, value) in doc.metadata.iter() {
        context.insert(key, value);
    }
    context.insert(CONTENT_VAR, &doc.body);
    context
}

/// Templates from one theme directory, loaded once and shared by every
/// document in a batch.
///
/// A template that fails to parse, or that extends one which did, is kept out
/// of the engine and only reported when a document asks for it.
#[derive(Debug)]
pub struct TemplateEngine {
    root: PathBuf,
    tera: Tera,
    broken: BTreeMap<String, String>,
}

impl TemplateEngine {
    /// Load every `*.html` file under `root`, skipping the theme's `static/`
    /// assets. Templates are named by their root-relative path with `/`
    /// separators, so nested templates can `{% extends "layouts/base.html" %}`.
    pub fn new(root: &Path) -> Result<Self, RenderError> {
        let mut sources = Vec::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.depth() == 1 && e.file_type().is_dir() && e.file_name() == STATIC_DIR));
        for entry in walker {
            let entry = entry.map_err(|source| RenderError::Walk {
                root: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() || !has_template_extension(entry.path()) {
                continue;
            }
            let text = fs::read_to_string(entry.path()).map_err(|source| RenderError::Read {
                path: entry.path().to_path_buf(),
                source,
            })?;
            sources.push((template_name_for(root, entry.path()), text));
        }

        let mut broken = BTreeMap::new();
        sources.retain(|(name, text)| match check_syntax(name, text) {
            Ok(()) => true,
            Err(detail) => {
                warn!(template = %name, "template failed to parse: {detail}");
                broken.insert(name.clone(), detail);
                false
            }
        });

        // Children of a broken or missing parent are dropped one at a time
        // until the inheritance chains build.
        let tera = loop {
            let mut tera = Tera::default();
            tera.autoescape_on(vec![]);
            let err = match tera.add_raw_templates(sources.iter().map(|(n, t)| (n.as_str(), t.as_str()))) {
                Ok(()) => break tera,
                Err(err) => err,
            };
            let orphan = match &err.kind {
                ErrorKind::MissingParent { current, .. }
                    if sources.iter().any(|(n, _)| n == current) =>
                {
                    Some(current.clone())
                }
                _ => None,
            };
            let Some(orphan) = orphan else {
                return Err(RenderError::Load {
                    root: root.to_path_buf(),
                    detail: error_detail(&err),
                    source: err,
                });
            };
            let detail = error_detail(&err);
            warn!(template = %orphan, "template cannot be loaded: {detail}");
            broken.insert(orphan.clone(), detail);
            sources.retain(|(n, _)| *n != orphan);
        };

        debug!(
            root = %root.display(),
            templates = tera.get_template_names().count(),
            broken = broken.len(),
            "loaded templates"
        );
        Ok(Self {
            root: root.to_path_buf(),
            tera,
            broken,
        })
    }

    pub(crate) fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Usable template names in sorted order.
    #[cfg(test)]
    pub(crate) fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    /// Render `doc` through the template called `name`.
    ///
    /// `doc.body` must already be HTML; see [`markdown_to_html`].
    pub fn render(&self, doc: &ParsedDocument, name: &str) -> Result<String, RenderError> {
        if let Some(detail) = self.broken.get(name) {
            return Err(RenderError::Template {
                name: name.to_string(),
                detail: detail.clone(),
                source: tera::Error::msg(detail),
            });
        }
        if !self.has_template(name) {
            return Err(RenderError::TemplateNotFound {
                name: name.to_string(),
                root: self.root.clone(),
            });
        }
        self.tera
            .render(name, &template_context(doc))
            .map_err(|source| RenderError::Template {
                name: name.to_string(),
                detail: error_detail(&source),
                source,
            })
    }
}

/// Parse `text` on its own. Only syntax counts here: a scratch engine keeps a
/// parsed template even when its parent or macro imports are missing.
fn check_syntax(name: &str, text: &str) -> Result<(), String> {
    let mut scratch = Tera::default();
    match scratch.add_raw_template(name, text) {
        Ok(()) => Ok(()),
        Err(_) if scratch.get_template_names().any(|n| n == name) => Ok(()),
        Err(err) => Err(error_detail(&err)),
    }
}

/// How a document picks its template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Renderer {
    /// Every article shares [`ARTICLE_TEMPLATE`].
    Article,
    /// Each page has its own template named after the source file stem.
    Page,
}

impl Renderer {
    pub fn template_name(self, source: &Path) -> String {
        match self {
            Renderer::Article => ARTICLE_TEMPLATE.to_string(),
            Renderer::Page => format!("{}{PAGE_TEMPLATE_SUFFIX}", file_stem(source)),
        }
    }

    /// Convert the body to HTML and render it with this renderer's template.
    pub fn render(
        self,
        engine: &TemplateEngine,
        source: &Path,
        mut doc: ParsedDocument,
    ) -> Result<String, RenderError> {
        doc.body = markdown_to_html(&doc.body);
        engine.render(&doc, &self.template_name(source))
    }
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn has_template_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(TEMPLATE_EXTENSION))
        .unwrap_or(false)
}

fn template_name_for(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Tera keeps the useful part of an error (line, column, missing variable) in
/// the source chain, so flatten it into one line.
fn error_detail(err: &tera::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}
