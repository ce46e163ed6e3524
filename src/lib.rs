//! # gensite
//!
//! A small static site generator. Markdown documents carry a front matter
//! header; the header becomes template variables and the body becomes the
//! `content` variable of a theme template.
//!
//! # Architecture: One Batch Per Content Directory
//!
//! ```text
//! content/articles/*.md  ─┐                       ┌─> publish/<stem>.html
//!                         ├─ parse ─ render ─ write
//! content/pages/*.md     ─┘                       └─> publish/static/  (theme assets)
//! ```
//!
//! Each batch resolves the theme once, copies its static assets, loads every
//! template, then processes the documents independently. A document with a
//! missing or malformed header is recorded in the batch report and skipped;
//! the rest of the batch carries on.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`frontmatter`] | Splits a document into its `key: value` header and markdown body |
//! | [`theme`] | Resolves the requested theme with fallback; copies `static/` assets |
//! | [`render`] | Markdown to HTML, template loading, Article and Page renderers |
//! | [`generate`] | Batch driver: discovery, worker pool, cancellation, atomic writes, reports |
//! | [`config`] | `config.toml` loading and validation |
//! | [`scaffold`] | `gensite init`: project layout and stock template copy |
//! | [`output`] | CLI output formatting for batch reports |
//!
//! # Design Decisions
//!
//! ## Runtime Templates
//!
//! Themes are plain directories of Tera templates that users edit without
//! recompiling, so templates are loaded from disk per batch. Autoescaping is
//! off: the body is already HTML and header values are inserted as written.
//!
//! ## Flat Output Names
//!
//! Every document writes to `publish/<stem>.html` regardless of how deep it
//! sits under the content directory. Two documents with the same stem are
//! written one after the other in sorted path order, so the last path wins
//! and the result does not depend on worker scheduling.
//!
//! ## Per-Document Failures Are Data
//!
//! Header problems are expected in hand-written content. They are collected
//! into [`generate::GenerationReport`] rather than aborting the batch. Only
//! problems that affect every document (missing theme, broken template,
//! unwritable output) are returned as errors.

pub mod config;
pub mod frontmatter;
pub mod generate;
pub mod output;
pub mod render;
pub mod scaffold;
pub mod theme;

#[cfg(test)]
pub(crate) mod test_helpers;
