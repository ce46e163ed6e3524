//! Front matter parsing.
//!
//! Every source document starts with a header block fenced by two lines that
//! begin with `---`, followed by a markdown body:
//!
//! ```text
//! ---
//! title: Hello
//! date: 2024-05-01
//! ---
//! # Hi
//! ```
//!
//! Header lines are `key:value` pairs split on the single colon they contain.
//! The key is kept exactly as written; the value is trimmed. Anything before
//! the opening fence is ignored, and everything after the closing fence is the
//! body, line breaks preserved.
//!
//! Parsing never panics and never touches the filesystem: the batch driver in
//! [`crate::generate`] reads the file and hands the text here, so an I/O
//! failure can never be mistaken for a bad header.

use thiserror::Error;

/// Opening and closing fence of the header block, matched as a line prefix.
pub const DELIMITER: &str = "---";

/// Why a document's header could not be parsed.
///
/// Both variants are per-document data problems: the batch records them and
/// moves on to the next file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("no front matter: no line starting with '---' found")]
    Missing,
    #[error("malformed front matter at line {line}: missing or multiple ':' separators in {text:?}")]
    Malformed { line: usize, text: String },
}

/// Header key/value pairs in the order they appear in the document.
///
/// Keys are unique. Inserting an existing key replaces its value in place, so
/// the last occurrence in the header wins while the first occurrence keeps its
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    /// Insert or replace a value, returning the previous one if the key existed.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A source document split into its header and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub metadata: Metadata,
    /// Markdown source until the pipeline swaps in the rendered HTML.
    pub body: String,
}

/// Split `text` into front matter and body.
///
/// Fails with [`HeaderError::Missing`] when no line starts with `---`, and with
/// [`HeaderError::Malformed`] on the first header line that does not contain
/// exactly one `:`. A header that is never closed swallows the rest of the
/// document, leaving an empty body.
pub fn parse(text: &str) -> Result<ParsedDocument, HeaderError> {
    let mut lines = text.split_inclusive('\n').enumerate();

    lines
        .by_ref()
        .find(|(_, line)| line.starts_with(DELIMITER))
        .ok_or(HeaderError::Missing)?;

    let mut metadata = Metadata::default();
    for (idx, line) in lines.by_ref() {
        if line.starts_with(DELIMITER) {
            break;
        }
        let line = strip_line_ending(line);
        let (key, value) = split_header_line(line).ok_or_else(|| HeaderError::Malformed {
            line: idx + 1,
            text: line.to_string(),
        })?;
        metadata.insert(key, value);
    }

    let body = lines.map(|(_, line)| line).collect();
    Ok(ParsedDocument { metadata, body })
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// `key:value` with exactly one colon. Key untouched, value trimmed.
fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    if value.contains(':') {
        return None;
    }
    Some((key, value.trim()))
}
