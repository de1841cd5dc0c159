//! Integration tests for the publish pipeline.
//!
//! Each test builds a throwaway content repository in a temp dir and talks
//! to a recording fake of [`MediumApi`], so no network access is needed.

use async_trait::async_trait;
use medium_publish::{
    prepare, publish, publish_all, publish_sync, rewrite_to_file, MediumApi, PublishConfig,
    PublishError, PublishOutcome, PublishProgressCallback, PublishRequest, UserId,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A repository with `.git/` and the given files.
fn repo_with(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join(".git")).unwrap();
    for (rel, contents) in files {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
    dir
}

fn canonical(dir: &TempDir) -> PathBuf {
    std::fs::canonicalize(dir.path()).unwrap()
}

/// Records calls; identity fails when `identity_status` is set.
#[derive(Default)]
struct FakeMedium {
    identity_status: Option<u16>,
    me_calls: AtomicUsize,
    post_calls: AtomicUsize,
    requests: Mutex<Vec<(String, PublishRequest)>>,
}

impl FakeMedium {
    fn failing_identity(status: u16) -> Self {
        Self {
            identity_status: Some(status),
            ..Default::default()
        }
    }

    fn calls(&self) -> (usize, usize) {
        (
            self.me_calls.load(Ordering::SeqCst),
            self.post_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl MediumApi for FakeMedium {
    async fn current_user(&self) -> Result<UserId, PublishError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        match self.identity_status {
            Some(status) => Err(PublishError::ApiStatus {
                url: "fake://me".into(),
                status,
                body: "Token was invalid.".into(),
            }),
            None => Ok(UserId("user-1".into())),
        }
    }

    async fn create_post(
        &self,
        user: &UserId,
        request: &PublishRequest,
    ) -> Result<serde_json::Value, PublishError> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((user.0.clone(), request.clone()));
        Ok(json!({
            "data": {
                "id": "post-1",
                "title": request.title,
                "publishStatus": request.publish_status,
                "url": "https://medium.com/@someone/post-1"
            }
        }))
    }
}

fn config_with(api: Arc<FakeMedium>, token: Option<&str>) -> PublishConfig {
    let mut builder = PublishConfig::builder()
        .repo("owner/repo")
        .branch("main")
        .api(api);
    if let Some(t) = token {
        builder = builder.token(t);
    }
    builder.build().unwrap()
}

const POST: &str = "---\ntitle: \"Landsat composites\"\ntags: [Earth Engine, \"Python\"]\n---\n\
# Intro\n\n![composite](index_files/figure-gfm/cell-3.png)\n\n![remote](https://example.org/x.png)\n";

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scenario_rewrite_inside_repo() {
    let repo = repo_with(&[("posts/p1/index.md", "![a](img/x.png)")]);
    let api = Arc::new(FakeMedium::default());
    let prepared = prepare(repo.path().join("posts/p1/index.md"), &config_with(api, None))
        .await
        .unwrap();
    assert_eq!(
        prepared.request.content,
        "![a](https://raw.githubusercontent.com/owner/repo/main/posts/p1/img/x.png)"
    );
    assert_eq!(prepared.rewritten_images, 1);
}

#[tokio::test]
async fn no_token_is_a_successful_dry_run_without_network() {
    let repo = repo_with(&[("posts/landsat/index.md", POST)]);
    let api = Arc::new(FakeMedium::default());
    let config = config_with(Arc::clone(&api), None);

    let outcome = publish(repo.path().join("posts/landsat/index.md"), &config)
        .await
        .expect("dry run succeeds");

    let PublishOutcome::DryRun(report) = outcome else {
        panic!("expected a dry run");
    };
    assert_eq!(report.title, "Landsat composites");
    assert_eq!(report.tags, vec!["Earth Engine", "Python"]);
    assert_eq!(report.rewritten_images, 1);
    assert!(report.token_hint.is_none());
    assert!(report.content_chars > 0);
    assert_eq!(api.calls(), (0, 0), "dry run must not call the API");
}

#[tokio::test]
async fn forced_dry_run_shows_redacted_token() {
    let repo = repo_with(&[("posts/a/index.md", "text")]);
    let api = Arc::new(FakeMedium::default());
    let config = PublishConfig::builder()
        .token("abcdef123456")
        .dry_run(true)
        .api(Arc::clone(&api) as Arc<dyn MediumApi>)
        .build()
        .unwrap();

    let outcome = publish(repo.path().join("posts/a/index.md"), &config)
        .await
        .unwrap();
    let PublishOutcome::DryRun(report) = outcome else {
        panic!("expected a dry run");
    };
    assert_eq!(report.token_hint.as_deref(), Some("abcd..."));
    assert!(!report.to_string().contains("abcdef123456"));
    assert_eq!(api.calls(), (0, 0));
}

#[tokio::test]
async fn identity_failure_stops_before_post_creation() {
    let repo = repo_with(&[("posts/a/index.md", POST)]);
    let api = Arc::new(FakeMedium::failing_identity(401));
    let config = config_with(Arc::clone(&api), Some("tok"));

    let err = publish(repo.path().join("posts/a/index.md"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::ApiStatus { status: 401, .. }), "{err}");
    assert_eq!(api.calls(), (1, 0), "no post may be created after identity failure");
}

#[tokio::test]
async fn publish_sends_draft_request() {
    let repo = repo_with(&[("posts/landsat/index.md", POST)]);
    let api = Arc::new(FakeMedium::default());
    let config = config_with(Arc::clone(&api), Some("tok"));

    let outcome = publish(repo.path().join("posts/landsat/index.md"), &config)
        .await
        .unwrap();
    assert_eq!(outcome.post_url(), Some("https://medium.com/@someone/post-1"));
    assert_eq!(api.calls(), (1, 1));

    let requests = api.requests.lock().unwrap();
    let (user, request) = &requests[0];
    assert_eq!(user, "user-1");
    assert_eq!(request.title, "Landsat composites");
    assert_eq!(request.content_format, "markdown");
    assert_eq!(request.publish_status, "draft");
    assert!(request.content.starts_with("# Intro"), "front matter must be stripped");
    assert!(request.content.contains(
        "![composite](https://raw.githubusercontent.com/owner/repo/main/posts/landsat/index_files/figure-gfm/cell-3.png)"
    ));
    assert!(request.content.contains("![remote](https://example.org/x.png)"));
}

#[tokio::test]
async fn missing_document_fails_before_network() {
    let api = Arc::new(FakeMedium::default());
    let config = config_with(Arc::clone(&api), Some("tok"));
    let err = publish("/no/such/post/index.md", &config).await.unwrap_err();
    assert!(matches!(err, PublishError::FileNotFound { .. }));
    assert_eq!(api.calls(), (0, 0));
}

// ── Metadata fallbacks ───────────────────────────────────────────────────────

#[tokio::test]
async fn untitled_document_uses_file_stem_and_default_tags() {
    let repo = repo_with(&[("posts/a/landsat-notes.md", "Just a body.\n")]);
    let config = PublishConfig::builder()
        .repo("owner/repo")
        .build()
        .unwrap();

    let prepared = prepare(repo.path().join("posts/a/landsat-notes.md"), &config)
        .await
        .unwrap();
    assert_eq!(prepared.request.title, "landsat-notes");
    assert_eq!(prepared.request.tags, vec!["Earth Engine", "Python"]);
    assert_eq!(prepared.request.content, "Just a body.\n");
    assert!(prepared.front_matter.is_empty());
}

#[tokio::test]
async fn configured_default_tags_replace_builtin_list() {
    let repo = repo_with(&[("posts/a/index.md", "---\ntitle: T\n---\nbody")]);
    let config = PublishConfig::builder()
        .repo("jdoe/ground-truth")
        .default_tags(["Remote Sensing"])
        .build()
        .unwrap();
    let prepared = prepare(repo.path().join("posts/a/index.md"), &config)
        .await
        .unwrap();
    assert_eq!(prepared.request.tags, vec!["Remote Sensing"]);
}

#[tokio::test]
async fn canonical_url_from_front_matter() {
    let repo = repo_with(&[(
        "posts/a/index.md",
        "---\ntitle: T\ncanonical_url: https://blog.example.org/t\n---\nbody",
    )]);
    let config = PublishConfig::builder().repo("o/r").build().unwrap();
    let prepared = prepare(repo.path().join("posts/a/index.md"), &config)
        .await
        .unwrap();
    assert_eq!(
        prepared.request.canonical_url.as_deref(),
        Some("https://blog.example.org/t")
    );
}

#[tokio::test]
async fn without_repository_images_are_left_unchanged() {
    let repo = repo_with(&[("posts/a/index.md", "![a](img/x.png)")]);
    let config = PublishConfig::default();
    let prepared = prepare(repo.path().join("posts/a/index.md"), &config)
        .await
        .unwrap();
    assert_eq!(prepared.request.content, "![a](img/x.png)");
    assert_eq!(prepared.rewritten_images, 0);
}

#[tokio::test]
async fn explicit_repo_root_limits_rewriting() {
    let repo = repo_with(&[
        ("site/posts/a/index.md", "![in](img/x.png) ![out](../../../shared/y.png)"),
        ("shared/y.png", "png"),
    ]);
    let config = PublishConfig::builder()
        .repo("owner/repo")
        .branch("gh-pages")
        .repo_root(repo.path().join("site"))
        .build()
        .unwrap();
    let prepared = prepare(repo.path().join("site/posts/a/index.md"), &config)
        .await
        .unwrap();
    assert_eq!(
        prepared.request.content,
        "![in](https://raw.githubusercontent.com/owner/repo/gh-pages/posts/a/img/x.png) \
         ![out](../../../shared/y.png)"
    );
    assert_eq!((prepared.rewritten_images, prepared.kept_images), (1, 1));
}

// ── Multi-document runs ──────────────────────────────────────────────────────

struct Counting {
    completes: AtomicUsize,
    errors: AtomicUsize,
    success_total: AtomicUsize,
}

impl PublishProgressCallback for Counting {
    fn on_document_complete(&self, _i: usize, _t: usize, _p: &Path, _o: &PublishOutcome) {
        self.completes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_document_error(&self, _i: usize, _t: usize, _p: &Path, _e: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    fn on_run_complete(&self, _total: usize, success_count: usize) {
        self.success_total.store(success_count, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn one_failing_document_does_not_block_siblings() {
    let repo = repo_with(&[("posts/a/index.md", "A"), ("posts/c/index.md", "C")]);
    let counting = Arc::new(Counting {
        completes: AtomicUsize::new(0),
        errors: AtomicUsize::new(0),
        success_total: AtomicUsize::new(0),
    });
    let config = PublishConfig::builder()
        .repo("owner/repo")
        .progress_callback(Arc::clone(&counting) as Arc<dyn PublishProgressCallback>)
        .build()
        .unwrap();

    let paths = vec![
        repo.path().join("posts/a/index.md"),
        repo.path().join("posts/b/index.md"),
        repo.path().join("posts/c/index.md"),
    ];
    let results = publish_all(&paths, &config).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().unwrap().is_dry_run());
    assert!(matches!(results[1], Err(PublishError::FileNotFound { .. })));
    assert!(results[2].as_ref().unwrap().is_dry_run());
    assert_eq!(counting.completes.load(Ordering::SeqCst), 2);
    assert_eq!(counting.errors.load(Ordering::SeqCst), 1);
    assert_eq!(counting.success_total.load(Ordering::SeqCst), 2);
}

#[test]
fn publish_sync_dry_run() {
    let repo = repo_with(&[("posts/a/index.md", "---\ntitle: Sync\n---\nbody")]);
    let outcome = publish_sync(repo.path().join("posts/a/index.md"), &PublishConfig::default())
        .unwrap();
    let PublishOutcome::DryRun(report) = outcome else {
        panic!("expected a dry run");
    };
    assert_eq!(report.title, "Sync");
}

// ── Rewrite-only mode ────────────────────────────────────────────────────────

#[tokio::test]
async fn rewrite_to_file_defaults_to_medium_md() {
    let repo = repo_with(&[("posts/landsat/index.md", POST)]);
    let config = PublishConfig::builder().repo("owner/repo").build().unwrap();

    let summary = rewrite_to_file(repo.path().join("posts/landsat/index.md"), None, &config)
        .await
        .unwrap();
    let expected = canonical(&repo).join("posts/landsat/medium.md");
    assert_eq!(summary.output_path, expected);
    assert_eq!((summary.rewritten_images, summary.kept_images), (1, 1));

    let written = std::fs::read_to_string(&expected).unwrap();
    assert!(written.starts_with("---\ntitle: \"Landsat composites\""), "front matter kept");
    assert!(written.contains(
        "(https://raw.githubusercontent.com/owner/repo/main/posts/landsat/index_files/figure-gfm/cell-3.png)"
    ));
}

#[tokio::test]
async fn rewrite_to_file_explicit_output() {
    let repo = repo_with(&[("posts/a/index.md", "![a](img/x.png)\n")]);
    let out = repo.path().join("build/out.md");
    let config = PublishConfig::builder().repo("owner/repo").build().unwrap();
    rewrite_to_file(repo.path().join("posts/a/index.md"), Some(&out), &config)
        .await
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "![a](https://raw.githubusercontent.com/owner/repo/main/posts/a/img/x.png)\n"
    );
}

#[tokio::test]
async fn rewrite_to_file_requires_repository() {
    let repo = repo_with(&[("posts/a/index.md", "![a](img/x.png)")]);
    let err = rewrite_to_file(repo.path().join("posts/a/index.md"), None, &PublishConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::MissingRepository));
    assert!(!repo.path().join("posts/a/medium.md").exists());
}
