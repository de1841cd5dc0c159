//! Front-matter extraction: split a document into metadata and body.
//!
//! Rendered Markdown (e.g. `quarto render --to gfm`) keeps a YAML-ish header
//! between two `---` lines. Only a handful of simple `key: value` fields are
//! ever consumed downstream (`title`, `tags`, `canonical_url`), so this is a
//! line parser rather than a YAML parser. It never fails: lines it does not
//! understand are dropped and a document without a header comes back as
//! [`ParsedDocument::Plain`] with the text untouched.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// The delimiter line opening and closing a front-matter block.
pub const DELIMITER: &str = "---";

/// Keys read as sequences, either `[a, b]` or bare `a, b`.
const LIST_KEYS: &[&str] = &["tags", "categories", "keywords"];

/// A single front-matter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FrontMatterValue {
    Scalar(String),
    List(Vec<String>),
}

/// Parsed front-matter fields, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrontMatter {
    fields: BTreeMap<String, FrontMatterValue>,
}

impl FrontMatter {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, key: &str) -> Option<&FrontMatterValue> {
        self.fields.get(key)
    }

    /// A scalar field, `None` when absent, empty or a list.
    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FrontMatterValue::Scalar(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// A list field. A non-empty scalar is read as a one-element list.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        match self.fields.get(key) {
            Some(FrontMatterValue::List(items)) if !items.is_empty() => Some(items.clone()),
            Some(FrontMatterValue::Scalar(s)) if !s.is_empty() => Some(vec![s.clone()]),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FrontMatterValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FrontMatterValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Result of splitting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDocument<'a> {
    /// A delimited block was found at the top of the document.
    WithFrontMatter {
        front_matter: FrontMatter,
        body: &'a str,
    },
    /// No block; the body is the whole input.
    Plain { body: &'a str },
}

impl<'a> ParsedDocument<'a> {
    pub fn body(&self) -> &'a str {
        match self {
            ParsedDocument::WithFrontMatter { body, .. } | ParsedDocument::Plain { body } => *body,
        }
    }

    /// Parsed fields, or an empty mapping for [`ParsedDocument::Plain`].
    pub fn front_matter(&self) -> FrontMatter {
        match self {
            ParsedDocument::WithFrontMatter { front_matter, .. } => front_matter.clone(),
            ParsedDocument::Plain { .. } => FrontMatter::default(),
        }
    }

    pub fn into_parts(self) -> (FrontMatter, &'a str) {
        match self {
            ParsedDocument::WithFrontMatter { front_matter, body } => (front_matter, body),
            ParsedDocument::Plain { body } => (FrontMatter::default(), body),
        }
    }
}

/// Split `text` into front matter and body.
pub fn parse_front_matter(text: &str) -> ParsedDocument<'_> {
    let Some((block, body)) = split_block(text) else {
        return ParsedDocument::Plain { body: text };
    };

    let mut front_matter = FrontMatter::default();
    for line in block.lines() {
        if let Some((key, value)) = parse_line(line) {
            front_matter.insert(key, value);
        }
    }
    debug!("Front matter: {} field(s)", front_matter.len());

    ParsedDocument::WithFrontMatter { front_matter, body }
}

/// Locate the block between the opening and closing delimiter lines.
///
/// Returns `(block, body)` slices of `text`.
fn split_block(text: &str) -> Option<(&str, &str)> {
    let (first, rest) = split_line(text)?;
    if first != DELIMITER {
        return None;
    }

    let mut offset = 0;
    let mut remaining = rest;
    while let Some((line, after)) = split_line(remaining) {
        if line == DELIMITER {
            let block = rest[..offset].trim_end_matches(['\n', '\r']);
            return Some((block, after));
        }
        offset += remaining.len() - after.len();
        remaining = after;
    }
    None
}

/// Split off the first line (without its terminator). `None` on empty input.
///
/// A line ending with `\r\n` is returned without the `\r`.
fn split_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    let (line, rest) = match text.find('\n') {
        Some(i) => (&text[..i], &text[i + 1..]),
        None => (text, ""),
    };
    Some((line.strip_suffix('\r').unwrap_or(line), rest))
}

fn parse_line(line: &str) -> Option<(String, FrontMatterValue)> {
    if line.trim().is_empty() {
        return None;
    }
    let (key, raw) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let raw = strip_double_quotes(raw.trim());

    let value = if LIST_KEYS.contains(&key) {
        let inner = raw
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .unwrap_or(raw);
        FrontMatterValue::List(split_list(inner))
    } else {
        FrontMatterValue::Scalar(raw.to_string())
    };
    Some((key.to_string(), value))
}

fn split_list(inner: &str) -> Vec<String> {
    inner
        .split(',')
        .map(|piece| strip_one_quote_layer(piece.trim()).trim())
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_double_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(s)
}

fn strip_one_quote_layer(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|r| r.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}
