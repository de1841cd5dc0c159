//! Configuration types for preparing and publishing a post.
//!
//! Everything the pipeline needs from its surroundings (credential,
//! repository, branch, endpoints, timeouts) lives in [`PublishConfig`],
//! built via [`PublishConfigBuilder`]. The library never reads the process
//! environment itself; the binary does that once and passes the values in.
//! The helpers [`resolve_token`] and [`resolve_branch`] encode the lookup
//! precedence so it can be tested without touching real environment
//! variables.

use crate::error::PublishError;
use crate::pipeline::api::MediumApi;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable checked first for the API token.
pub const TOKEN_ENV: &str = "MEDIUM_TOKEN";
/// Legacy environment variable checked when [`TOKEN_ENV`] is unset or empty.
pub const LEGACY_TOKEN_ENV: &str = "MEDIUM_INTEGRATION_TOKEN";
/// Environment variable holding `owner/repo`.
pub const REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";
/// Environment variable holding the branch name.
pub const BRANCH_ENV: &str = "GITHUB_REF_NAME";

/// Branch used when none is configured.
pub const DEFAULT_BRANCH: &str = "main";
/// Host serving raw repository content.
pub const DEFAULT_RAW_HOST: &str = "https://raw.githubusercontent.com";
/// Base URL of the Medium REST API.
pub const DEFAULT_API_BASE: &str = "https://api.medium.com/v1";
/// Index file looked for inside each post directory.
pub const DEFAULT_INDEX_FILE: &str = "index.md";
/// Tags sent when neither the front matter nor the caller provides any.
pub const DEFAULT_TAGS: [&str; 2] = ["Earth Engine", "Python"];

/// Configuration for one prepare/publish run.
///
/// # Example
/// ```rust
/// use medium_publish::PublishConfig;
///
/// let config = PublishConfig::builder()
///     .repo("owner/repo")
///     .branch("main")
///     .default_tags(["Rust", "Markdown"])
///     .build()
///     .unwrap();
/// assert!(config.token.is_none());
/// ```
#[derive(Clone)]
pub struct PublishConfig {
    /// Medium integration token. `None` selects the dry-run path.
    pub token: Option<String>,

    /// Repository identifier, `owner/repo`. Used in generated image URLs.
    pub repo: Option<String>,

    /// Branch used in generated image URLs. Default: `main`.
    pub branch: String,

    /// Root of the local content repository. When `None` the root is
    /// discovered by walking up from the document to the nearest `.git`.
    pub repo_root: Option<PathBuf>,

    /// Host prefix of generated image URLs. Default: raw.githubusercontent.com.
    pub raw_host: String,

    /// Base URL of the platform API, without trailing slash.
    pub api_base_url: String,

    /// Tags sent when the document's front matter has none.
    /// Default: [`DEFAULT_TAGS`].
    pub default_tags: Vec<String>,

    /// Timeout for the identity lookup in seconds. Default: 30.
    pub identity_timeout_secs: u64,

    /// Timeout for post creation in seconds. Default: 60.
    ///
    /// Longer than the identity bound because the request carries the full
    /// document body.
    pub post_timeout_secs: u64,

    /// Report what would be published even when a token is available.
    pub dry_run: bool,

    /// File name of a post's document inside its directory. Default: `index.md`.
    pub index_file_name: String,

    /// Pre-constructed API client. Takes precedence over the built-in
    /// reqwest client built from `api_base_url` and `token`.
    pub api: Option<Arc<dyn MediumApi>>,

    /// Optional per-document progress events for multi-document runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            token: None,
            repo: None,
            branch: DEFAULT_BRANCH.to_string(),
            repo_root: None,
            raw_host: DEFAULT_RAW_HOST.to_string(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            default_tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            identity_timeout_secs: 30,
            post_timeout_secs: 60,
            dry_run: false,
            index_file_name: DEFAULT_INDEX_FILE.to_string(),
            api: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishConfig")
            .field("token", &self.token.as_deref().map(redact_token))
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("repo_root", &self.repo_root)
            .field("raw_host", &self.raw_host)
            .field("api_base_url", &self.api_base_url)
            .field("default_tags", &self.default_tags)
            .field("identity_timeout_secs", &self.identity_timeout_secs)
            .field("post_timeout_secs", &self.post_timeout_secs)
            .field("dry_run", &self.dry_run)
            .field("index_file_name", &self.index_file_name)
            .field("api", &self.api.as_ref().map(|_| "<dyn MediumApi>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PublishProgressCallback>"),
            )
            .finish()
    }
}

impl PublishConfig {
    /// Create a new builder for `PublishConfig`.
    pub fn builder() -> PublishConfigBuilder {
        PublishConfigBuilder {
            config: Self::default(),
        }
    }

    /// The repository identifier, validated, or an error when absent.
    pub fn require_repo(&self) -> Result<&str, PublishError> {
        match self.repo.as_deref() {
            Some(repo) => {
                validate_repo(repo)?;
                Ok(repo)
            }
            None => Err(PublishError::MissingRepository),
        }
    }

    /// Tags used when the front matter provides none.
    pub fn fallback_tags(&self) -> Vec<String> {
        self.default_tags.clone()
    }
}

/// Builder for [`PublishConfig`].
pub struct PublishConfigBuilder {
    config: PublishConfig,
}

impl fmt::Debug for PublishConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl PublishConfigBuilder {
    /// Set the token. Empty strings are treated as "no token".
    pub fn token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.config.token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    pub fn maybe_token(self, token: Option<String>) -> Self {
        match token {
            Some(t) => self.token(t),
            None => self,
        }
    }

    pub fn repo(mut self, repo: impl Into<String>) -> Self {
        let repo = repo.into();
        self.config.repo = if repo.trim().is_empty() {
            None
        } else {
            Some(repo.trim().to_string())
        };
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.config.branch = resolve_branch(Some(branch.into()));
        self
    }

    pub fn repo_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.repo_root = Some(root.into());
        self
    }

    pub fn raw_host(mut self, host: impl Into<String>) -> Self {
        self.config.raw_host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the fallback tags. An empty list is kept as is: front-matter-less
    /// posts are then sent without tags.
    pub fn default_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.default_tags = tags
            .into_iter()
            .map(|t| {
                let t: String = t.into();
                t.trim().to_string()
            })
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    pub fn identity_timeout_secs(mut self, secs: u64) -> Self {
        self.config.identity_timeout_secs = secs;
        self
    }

    pub fn post_timeout_secs(mut self, secs: u64) -> Self {
        self.config.post_timeout_secs = secs;
        self
    }

    pub fn dry_run(mut self, v: bool) -> Self {
        self.config.dry_run = v;
        self
    }

    pub fn index_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.index_file_name = name.into();
        self
    }

    pub fn api(mut self, api: Arc<dyn MediumApi>) -> Self {
        self.config.api = Some(api);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PublishConfig, PublishError> {
        let c = &self.config;
        if let Some(ref repo) = c.repo {
            validate_repo(repo)?;
        }
        if c.identity_timeout_secs == 0 || c.post_timeout_secs == 0 {
            return Err(PublishError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if !is_http_url(&c.raw_host) {
            return Err(PublishError::InvalidConfig(format!(
                "Raw host must be an http(s) URL, got '{}'",
                c.raw_host
            )));
        }
        if !is_http_url(&c.api_base_url) {
            return Err(PublishError::InvalidConfig(format!(
                "API base must be an http(s) URL, got '{}'",
                c.api_base_url
            )));
        }
        if c.index_file_name.is_empty() || c.index_file_name.contains(['/', '\\']) {
            return Err(PublishError::InvalidConfig(format!(
                "Index file name must be a bare file name, got '{}'",
                c.index_file_name
            )));
        }
        Ok(self.config)
    }
}

// ── Resolution helpers ───────────────────────────────────────────────────

/// Resolve the API token: [`TOKEN_ENV`] first, then [`LEGACY_TOKEN_ENV`].
/// The first non-empty value wins.
///
/// `lookup` is usually `|k| std::env::var(k).ok()`.
pub fn resolve_token<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    [TOKEN_ENV, LEGACY_TOKEN_ENV]
        .into_iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}

/// Resolve the branch name, defaulting to [`DEFAULT_BRANCH`] when unset or empty.
pub fn resolve_branch(value: Option<String>) -> String {
    value
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string())
}

/// Check that `repo` looks like `owner/repo`.
pub fn validate_repo(repo: &str) -> Result<(), PublishError> {
    let invalid = || PublishError::InvalidRepository {
        repo: repo.to_string(),
    };
    let (owner, name) = repo.split_once('/').ok_or_else(invalid)?;
    let ok = |s: &str| !s.is_empty() && !s.contains(char::is_whitespace);
    if !ok(owner) || !ok(name) || name.contains('/') {
        return Err(invalid());
    }
    Ok(())
}

/// First four characters of the token followed by `...`.
pub fn redact_token(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{prefix}...")
}

fn is_http_url(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn token_primary_wins() {
        let lookup = env(&[(TOKEN_ENV, "primary"), (LEGACY_TOKEN_ENV, "legacy")]);
        assert_eq!(resolve_token(lookup).as_deref(), Some("primary"));
    }

    #[test]
    fn token_falls_back_to_legacy_when_primary_empty() {
        let lookup = env(&[(TOKEN_ENV, ""), (LEGACY_TOKEN_ENV, "legacy")]);
        assert_eq!(resolve_token(lookup).as_deref(), Some("legacy"));
    }

    #[test]
    fn token_absent() {
        assert_eq!(resolve_token(env(&[])), None);
        assert_eq!(resolve_token(env(&[(LEGACY_TOKEN_ENV, "  ")])), None);
    }

    #[test]
    fn branch_defaults_to_main() {
        assert_eq!(resolve_branch(None), "main");
        assert_eq!(resolve_branch(Some(String::new())), "main");
        assert_eq!(resolve_branch(Some("gh-pages".into())), "gh-pages");
    }

    #[test]
    fn repo_validation() {
        assert!(validate_repo("owner/repo").is_ok());
        assert!(validate_repo("owner").is_err());
        assert!(validate_repo("/repo").is_err());
        assert!(validate_repo("owner/").is_err());
        assert!(validate_repo("a/b/c").is_err());
        assert!(validate_repo("own er/repo").is_err());
    }

    #[test]
    fn builder_rejects_bad_repo() {
        let err = PublishConfig::builder().repo("nope").build().unwrap_err();
        assert!(matches!(err, PublishError::InvalidRepository { .. }));
    }

    #[test]
    fn builder_treats_empty_token_as_absent() {
        let config = PublishConfig::builder().token("").build().unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn builder_trims_trailing_slashes() {
        let config = PublishConfig::builder()
            .raw_host("https://raw.example.com/")
            .api_base_url("http://127.0.0.1:9000/v1/")
            .build()
            .unwrap();
        assert_eq!(config.raw_host, "https://raw.example.com");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000/v1");
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(PublishConfig::builder()
            .identity_timeout_secs(0)
            .build()
            .is_err());
    }

    #[test]
    fn fallback_tags_default_and_override() {
        assert_eq!(
            PublishConfig::default().fallback_tags(),
            vec!["Earth Engine", "Python"]
        );

        let config = PublishConfig::builder()
            .default_tags(["Remote Sensing", " ", "GIS"])
            .build()
            .unwrap();
        assert_eq!(config.fallback_tags(), vec!["Remote Sensing", "GIS"]);

        let config = PublishConfig::builder()
            .default_tags(Vec::<String>::new())
            .build()
            .unwrap();
        assert!(config.fallback_tags().is_empty());
    }

    #[test]
    fn debug_redacts_token() {
        let config = PublishConfig::builder()
            .token("secret-token-value")
            .build()
            .unwrap();
        let dbg = format!("{config:?}");
        assert!(dbg.contains("secr..."));
        assert!(!dbg.contains("secret-token-value"));
    }
}
