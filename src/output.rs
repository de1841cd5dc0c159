//! Output types: the prepared post, the API request and the run outcome.

use crate::pipeline::frontmatter::FrontMatter;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Content format sent to the platform.
pub const CONTENT_FORMAT: &str = "markdown";
/// Publish status sent to the platform. Posts are only ever created as drafts.
pub const PUBLISH_STATUS: &str = "draft";

/// Body of `POST /users/{id}/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub title: String,
    pub content_format: &'static str,
    pub content: String,
    pub tags: Vec<String>,
    pub publish_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
}

impl PublishRequest {
    /// A draft request with the fixed format and status.
    pub fn draft(title: impl Into<String>, content: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            title: title.into(),
            content_format: CONTENT_FORMAT,
            content: content.into(),
            tags,
            publish_status: PUBLISH_STATUS,
            canonical_url: None,
        }
    }
}

/// A document after extraction and rewriting, ready to be submitted.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedPost {
    /// Canonical path of the source document.
    pub path: PathBuf,
    /// Fields read from the front matter.
    pub front_matter: FrontMatter,
    /// The request that would be (or was) sent.
    pub request: PublishRequest,
    /// Image references replaced with raw URLs.
    pub rewritten_images: usize,
    /// Image references left untouched.
    pub kept_images: usize,
}

/// What a dry run would have published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DryRunReport {
    pub path: PathBuf,
    pub title: String,
    pub tags: Vec<String>,
    /// Length of the final content in characters.
    pub content_chars: usize,
    pub rewritten_images: usize,
    /// Redacted token (`abcd...`) when one is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_hint: Option<String>,
}

impl fmt::Display for DryRunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Would publish {} as draft \"{}\" (len={} chars, {} image(s) rewritten, tags: [{}])",
            self.path.display(),
            self.title,
            self.content_chars,
            self.rewritten_images,
            self.tags.join(", ")
        )?;
        match self.token_hint {
            Some(ref hint) => write!(f, " using token prefix {hint}"),
            None => write!(f, "; no Medium token set, dry run only"),
        }
    }
}

/// Result of one document's run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// Nothing was sent.
    DryRun(DryRunReport),
    /// The platform's response to post creation.
    Published { response: serde_json::Value },
}

impl PublishOutcome {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, PublishOutcome::DryRun(_))
    }

    /// The post URL from a publish response, when present.
    pub fn post_url(&self) -> Option<&str> {
        match self {
            PublishOutcome::Published { response } => response
                .get("data")
                .and_then(|d| d.get("url"))
                .and_then(|u| u.as_str()),
            PublishOutcome::DryRun(_) => None,
        }
    }
}

/// Result of [`crate::publish::rewrite_to_file`].
#[derive(Debug, Clone, Serialize)]
pub struct RewriteSummary {
    pub output_path: PathBuf,
    pub rewritten_images: usize,
    pub kept_images: usize,
}
