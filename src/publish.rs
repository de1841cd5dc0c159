//! Publish orchestration: load → extract → rewrite → dry run or submit.
//!
//! ## States
//!
//! ```text
//!            token configured and not --dry-run
//!  prepare ─────────────────────────────────────▶ Publish
//!     │                                             ├─ GET  /me          (identity_timeout)
//!     │                                             └─ POST /users/{id}/posts (post_timeout)
//!     └──────────────────────────────────────────▶ DryRun (no network)
//! ```
//!
//! Both states are terminal. The document is loaded and rewritten before
//! the state is entered, so a missing file fails before any request is sent
//! and the identity lookup must succeed before a post is created. Nothing is
//! retried and nothing is persisted between runs.

use crate::config::{redact_token, PublishConfig};
use crate::error::PublishError;
use crate::output::{DryRunReport, PreparedPost, PublishOutcome, PublishRequest, RewriteSummary};
use crate::pipeline::api::{MediumApi, MediumClient};
use crate::pipeline::frontmatter::parse_front_matter;
use crate::pipeline::input::{load_document, resolve_repo_root};
use crate::pipeline::rewrite::{rewrite_image_refs, RewriteContext};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Medium keeps at most this many tags per post.
const MAX_TAGS: usize = 5;

/// File name used by [`rewrite_to_file`] when no output path is given.
pub const DEFAULT_OUTPUT_NAME: &str = "medium.md";

/// Which path a run takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishMode {
    /// Report only.
    DryRun,
    /// Authenticate and create a draft with this token.
    Publish { token: String },
}

impl PublishMode {
    pub fn from_config(config: &PublishConfig) -> Self {
        match config.token {
            Some(ref token) if !config.dry_run => PublishMode::Publish {
                token: token.clone(),
            },
            _ => PublishMode::DryRun,
        }
    }
}

/// Load a document and build the request that would be sent for it.
///
/// Never touches the network. Fails only when the document cannot be read.
pub async fn prepare(
    path: impl AsRef<Path>,
    config: &PublishConfig,
) -> Result<PreparedPost, PublishError> {
    let document = load_document(path.as_ref()).await?;
    let (front_matter, body) = parse_front_matter(&document.raw_text).into_parts();

    let (content, rewritten_images, kept_images) = match config.repo.as_deref() {
        Some(repo) => {
            let root = resolve_repo_root(config.repo_root.as_deref(), document.dir())?;
            let ctx = RewriteContext::for_document(
                &document.path,
                root,
                repo,
                config.branch.as_str(),
                config.raw_host.as_str(),
            );
            let out = rewrite_image_refs(body, &ctx);
            (out.markdown, out.rewritten, out.kept)
        }
        None => {
            warn!(
                "No repository identifier configured; image references in {} are left unchanged",
                document.path.display()
            );
            (body.to_string(), 0, 0)
        }
    };
    info!(
        "{}: {} image(s) rewritten, {} kept",
        document.path.display(),
        rewritten_images,
        kept_images
    );

    let title = front_matter
        .scalar("title")
        .map(str::to_string)
        .unwrap_or_else(|| document.stem());
    let tags = front_matter
        .list("tags")
        .unwrap_or_else(|| config.fallback_tags());
    if tags.len() > MAX_TAGS {
        warn!(
            "{} tags given; Medium keeps only the first {}",
            tags.len(),
            MAX_TAGS
        );
    }

    let mut request = PublishRequest::draft(title, content, tags);
    request.canonical_url = front_matter.scalar("canonical_url").map(str::to_string);

    Ok(PreparedPost {
        path: document.path,
        front_matter,
        request,
        rewritten_images,
        kept_images,
    })
}

/// Prepare a document and either report it (dry run) or create a draft.
///
/// # Errors
/// - the document cannot be read (before any network call)
/// - the identity lookup fails (no post is created)
/// - post creation fails
pub async fn publish(
    path: impl AsRef<Path>,
    config: &PublishConfig,
) -> Result<PublishOutcome, PublishError> {
    let path = path.as_ref();
    info!("Preparing {}", path.display());
    let prepared = prepare(path, config).await?;

    match PublishMode::from_config(config) {
        PublishMode::DryRun => {
            let report = dry_run_report(&prepared, config);
            info!("{}", report);
            Ok(PublishOutcome::DryRun(report))
        }
        PublishMode::Publish { token } => {
            let api = resolve_api(config, &token)?;
            let user = api.current_user().await?;
            let response = api.create_post(&user, &prepared.request).await?;
            info!(
                "Created draft \"{}\" for user {}",
                prepared.request.title, user
            );
            Ok(PublishOutcome::Published { response })
        }
    }
}

/// Synchronous wrapper around [`publish`].
///
/// Creates a temporary tokio runtime internally.
pub fn publish_sync(
    path: impl AsRef<Path>,
    config: &PublishConfig,
) -> Result<PublishOutcome, PublishError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PublishError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(publish(path, config))
}

/// Run [`publish`] for each path in order.
///
/// Returns one result per path. A failing document is recorded and the
/// next one still runs.
pub async fn publish_all(
    paths: &[PathBuf],
    config: &PublishConfig,
) -> Vec<Result<PublishOutcome, PublishError>> {
    let total = paths.len();
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_run_start(total);
    }

    let mut results = Vec::with_capacity(total);
    for (i, path) in paths.iter().enumerate() {
        let index = i + 1;
        if let Some(cb) = cb {
            cb.on_document_start(index, total, path);
        }
        let result = publish(path, config).await;
        match (&result, cb) {
            (Ok(outcome), Some(cb)) => cb.on_document_complete(index, total, path, outcome),
            (Err(e), Some(cb)) => cb.on_document_error(index, total, path, &e.to_string()),
            (Err(e), None) => warn!("{}: {}", path.display(), e),
            (Ok(_), None) => {}
        }
        results.push(result);
    }

    let success = results.iter().filter(|r| r.is_ok()).count();
    info!("Processed {} document(s), {} succeeded", total, success);
    if let Some(cb) = cb {
        cb.on_run_complete(total, success);
    }
    results
}

/// Rewrite image references in a whole document and write the result.
///
/// Front matter is kept as is. `output` defaults to `medium.md` next to the
/// input. The write is atomic: a temp file in the destination directory is
/// renamed over the target.
pub async fn rewrite_to_file(
    md_path: impl AsRef<Path>,
    output: Option<&Path>,
    config: &PublishConfig,
) -> Result<RewriteSummary, PublishError> {
    let repo = config.require_repo()?;
    let document = load_document(md_path.as_ref()).await?;
    let root = resolve_repo_root(config.repo_root.as_deref(), document.dir())?;
    let ctx = RewriteContext::for_document(
        &document.path,
        root,
        repo,
        config.branch.as_str(),
        config.raw_host.as_str(),
    );
    let out = rewrite_image_refs(&document.raw_text, &ctx);

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => document.path.with_file_name(DEFAULT_OUTPUT_NAME),
    };

    let target = output_path.clone();
    let contents = out.markdown;
    tokio::task::spawn_blocking(move || write_atomic(&target, contents.as_bytes()))
        .await
        .map_err(|e| PublishError::Internal(format!("write task failed: {e}")))??;

    info!("Wrote Medium-ready Markdown to {}", output_path.display());
    Ok(RewriteSummary {
        output_path,
        rewritten_images: out.rewritten,
        kept_images: out.kept,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn dry_run_report(prepared: &PreparedPost, config: &PublishConfig) -> DryRunReport {
    DryRunReport {
        path: prepared.path.clone(),
        title: prepared.request.title.clone(),
        tags: prepared.request.tags.clone(),
        content_chars: prepared.request.content.chars().count(),
        rewritten_images: prepared.rewritten_images,
        token_hint: config.token.as_deref().map(redact_token),
    }
}

/// The injected client if any, else a reqwest client for `token`.
fn resolve_api(config: &PublishConfig, token: &str) -> Result<Arc<dyn MediumApi>, PublishError> {
    if let Some(ref api) = config.api {
        return Ok(Arc::clone(api));
    }
    let client = MediumClient::new(
        config.api_base_url.as_str(),
        token,
        config.identity_timeout_secs,
        config.post_timeout_secs,
    )?;
    Ok(Arc::new(client))
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PublishError> {
    let write_err = |source| PublishError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
