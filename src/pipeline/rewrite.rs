//! Image-reference rewriting: local repository paths → raw GitHub URLs.
//!
//! Medium fetches images by URL when a draft is imported, so every
//! `![alt](img/figure.png)` that points into the content repository must
//! become `![alt](https://raw.githubusercontent.com/<owner/repo>/<branch>/<path>)`.
//! The images themselves have to be committed and pushed for those URLs to
//! resolve; nothing is uploaded here.
//!
//! ## Rules
//!
//! 1. Targets with an `http://` or `https://` scheme are kept byte for byte,
//!    which also makes the rewrite idempotent.
//! 2. Other targets are resolved against the document's directory and
//!    normalised lexically (`.` and `..` removed) without touching the
//!    filesystem. Relative directories and roots are anchored at the
//!    current directory first.
//! 3. A path that does not land under the repository root is kept as is.
//!    No URL is produced for content the repository does not track.
//! 4. Empty targets, `scheme://` targets and the opaque schemes `data:`,
//!    `mailto:`, `tel:`, `javascript:`, `blob:` and `about:` are kept as is.
//!    A bare file name containing a colon (`plot:1.png`) is still local.
//!
//! The scan is a non-greedy regex over single lines, not a Markdown parser.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").unwrap());

static RE_SCHEME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*://|(?i:data|mailto|tel|javascript|blob|about):)")
        .unwrap()
});

/// Everything the rewriter needs to know about where a document lives.
#[derive(Debug, Clone)]
pub struct RewriteContext {
    /// Directory containing the document; relative targets resolve here.
    pub document_dir: PathBuf,
    /// Root of the content repository.
    pub repo_root: PathBuf,
    /// `owner/repo`.
    pub repo: String,
    /// Branch the images are committed on.
    pub branch: String,
    /// URL prefix, e.g. `https://raw.githubusercontent.com`.
    pub raw_host: String,
}

impl RewriteContext {
    /// Context for a document at `document_path`.
    pub fn for_document(
        document_path: &Path,
        repo_root: impl Into<PathBuf>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        raw_host: impl Into<String>,
    ) -> Self {
        let document_dir = document_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            document_dir,
            repo_root: repo_root.into(),
            repo: repo.into(),
            branch: branch.into(),
            raw_host: raw_host.into(),
        }
    }

    /// The raw URL for `target`, or `None` when the reference must be kept.
    pub fn resolve(&self, target: &str) -> Option<String> {
        let target = target.trim();
        if target.is_empty() || RE_SCHEME.is_match(target) {
            return None;
        }
        let absolute = anchored(&self.document_dir.join(target))?;
        let root = anchored(&self.repo_root)?;
        let relative = absolute.strip_prefix(&root).ok()?;
        let relative = to_url_path(relative)?;
        Some(raw_url(&self.raw_host, &self.repo, &self.branch, &relative))
    }
}

/// Rewritten text plus counts for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub markdown: String,
    /// References replaced with a raw URL.
    pub rewritten: usize,
    /// References left untouched (remote, outside the repository, unresolvable).
    pub kept: usize,
}

/// Rewrite every local image reference in `body`.
pub fn rewrite_image_refs(body: &str, ctx: &RewriteContext) -> Rewritten {
    let mut rewritten = 0usize;
    let mut kept = 0usize;

    let markdown = RE_IMAGE
        .replace_all(body, |caps: &Captures<'_>| {
            let alt = &caps[1];
            let target = &caps[2];
            if is_remote(target) {
                kept += 1;
                return caps[0].to_string();
            }
            match ctx.resolve(target) {
                Some(url) => {
                    debug!("Image '{}' → {}", target, url);
                    rewritten += 1;
                    format!("![{alt}]({url})")
                }
                None => {
                    debug!("Image '{}' left unchanged", target);
                    kept += 1;
                    caps[0].to_string()
                }
            }
        })
        .into_owned();

    Rewritten {
        markdown,
        rewritten,
        kept,
    }
}

/// `<host>/<repo>/<branch>/<path>`.
pub fn raw_url(host: &str, repo: &str, branch: &str, repo_relative_path: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        host.trim_end_matches('/'),
        repo,
        branch,
        repo_relative_path.trim_start_matches('/')
    )
}

/// Inverse of [`raw_url`]: the repository-relative path encoded in `url`.
pub fn repo_relative_path<'u>(url: &'u str, host: &str, repo: &str, branch: &str) -> Option<&'u str> {
    url.strip_prefix(host.trim_end_matches('/'))?
        .strip_prefix('/')?
        .strip_prefix(repo)?
        .strip_prefix('/')?
        .strip_prefix(branch)?
        .strip_prefix('/')
}

/// True for `http://` and `https://` targets (case-insensitive scheme).
pub fn is_remote(target: &str) -> bool {
    let lower = target.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Canonicalise `.` and `..` path segments without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// `path` made absolute against the current directory, then normalised.
///
/// An empty path stands for the current directory. `None` when the current
/// directory cannot be determined.
fn anchored(path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return Some(normalize_path(path));
    }
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    std::path::absolute(path).ok().map(|p| normalize_path(&p))
}

/// Join the normal components of `relative` with `/`.
///
/// `None` when the path is empty (the reference named the root itself).
fn to_url_path(relative: &Path) -> Option<String> {
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
