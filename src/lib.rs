//! # medium-publish
//!
//! Prepare rendered Markdown for Medium and submit it as a draft.
//!
//! Posts authored in a Git repository reference their figures by relative
//! path (`![map](index_files/figure-gfm/cell-4.png)`). Medium cannot see the
//! repository, so before a document is imported every such reference is
//! rewritten to the raw GitHub URL of the committed file. The title and tags
//! come from the document's front matter.
//!
//! ## Pipeline Overview
//!
//! ```text
//! index.md
//!  │
//!  ├─ 1. Input        canonical path + UTF-8 text, repository root
//!  ├─ 2. Front matter `---` header → title, tags, canonical_url
//!  ├─ 3. Rewrite      ![alt](local) → ![alt](https://raw.githubusercontent.com/…)
//!  └─ 4. Publish      no token → dry-run report
//!                     token    → GET /me, then POST /users/{id}/posts (draft)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use medium_publish::{publish, PublishConfig, PublishOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PublishConfig::builder()
//!         .token(std::env::var("MEDIUM_TOKEN").unwrap_or_default())
//!         .repo("owner/repo")
//!         .branch("main")
//!         .build()?;
//!     match publish("posts/2025-11-06-landsat/index.md", &config).await? {
//!         PublishOutcome::DryRun(report) => println!("{report}"),
//!         PublishOutcome::Published { response } => println!("{response:#}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `medium-publish` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod posts;
pub mod progress;
pub mod publish;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{resolve_branch, resolve_token, PublishConfig, PublishConfigBuilder};
pub use error::PublishError;
pub use output::{DryRunReport, PreparedPost, PublishOutcome, PublishRequest, RewriteSummary};
pub use pipeline::api::{MediumApi, MediumClient, UserId};
pub use pipeline::frontmatter::{parse_front_matter, FrontMatter, FrontMatterValue, ParsedDocument};
pub use pipeline::rewrite::{rewrite_image_refs, RewriteContext, Rewritten};
pub use posts::find_posts;
pub use progress::{NoopProgressCallback, ProgressCallback, PublishProgressCallback};
pub use publish::{prepare, publish, publish_all, publish_sync, rewrite_to_file, PublishMode};
