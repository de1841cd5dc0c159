//! Error types for the medium-publish library.
//!
//! Only failures that involve the outside world are errors here: a missing
//! input document, an unusable repository identifier, or a remote API call
//! that did not succeed. Local anomalies are absorbed where they happen:
//!
//! * malformed front matter degrades to an empty mapping
//!   ([`crate::pipeline::frontmatter::ParsedDocument::Plain`]);
//! * an image reference that cannot be proven to live inside the repository
//!   is left untouched by [`crate::pipeline::rewrite`];
//! * a missing credential is not a failure at all, it selects the dry-run
//!   path in [`crate::publish`].
//!
//! Every variant of [`PublishError`] is fatal for the document being
//! processed. [`crate::publish::publish_all`] keeps one `Result` per
//! document so a failure never leaks into sibling documents.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the medium-publish library.
#[derive(Debug, Error)]
pub enum PublishError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file or directory was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The document exists but is not valid UTF-8 text.
    #[error("'{path}' is not valid UTF-8 text")]
    NotUtf8 { path: PathBuf },

    /// Any other I/O failure while reading input.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// A repository identifier is required but was not supplied.
    #[error("Missing repository identifier.\nPass --repo <owner/repo> or set GITHUB_REPOSITORY.")]
    MissingRepository,

    /// The repository identifier is not of the form `owner/repo`.
    #[error("Invalid repository identifier '{repo}': expected 'owner/repo'")]
    InvalidRepository { repo: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Remote API errors ─────────────────────────────────────────────────
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Connection-level failure (DNS, TLS, refused connection, …).
    #[error("Request to {url} failed: {reason}\nCheck your internet connection.")]
    Network { url: String, reason: String },

    /// The request did not complete within its timeout.
    #[error("Request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The API answered with a non-2xx status.
    #[error("{url} returned HTTP {status}: {body}")]
    ApiStatus {
        url: String,
        status: u16,
        body: String,
    },

    /// The API answered 2xx but the payload was not what we expected.
    #[error("Unexpected response from {url}: {detail}")]
    UnexpectedResponse { url: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PublishError {
    /// True for failures reported by (or on the way to) the remote API.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            PublishError::Network { .. }
                | PublishError::Timeout { .. }
                | PublishError::ApiStatus { .. }
                | PublishError::UnexpectedResponse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_display() {
        let e = PublishError::FileNotFound {
            path: PathBuf::from("posts/missing/index.md"),
        };
        assert!(e.to_string().contains("posts/missing/index.md"));
    }

    #[test]
    fn api_status_display() {
        let e = PublishError::ApiStatus {
            url: "https://api.medium.com/v1/me".into(),
            status: 401,
            body: "Token was invalid.".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("401"), "got: {msg}");
        assert!(msg.contains("/v1/me"), "got: {msg}");
        assert!(e.is_remote());
    }

    #[test]
    fn timeout_display() {
        let e = PublishError::Timeout {
            url: "https://api.medium.com/v1/users/u1/posts".into(),
            secs: 60,
        };
        assert!(e.to_string().contains("60s"));
        assert!(e.is_remote());
    }

    #[test]
    fn missing_repository_mentions_flag() {
        let msg = PublishError::MissingRepository.to_string();
        assert!(msg.contains("--repo"));
        assert!(!PublishError::MissingRepository.is_remote());
    }
}
