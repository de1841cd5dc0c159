//! CLI binary for medium-publish.
//!
//! A thin shim over the library crate: reads the environment once, maps
//! flags to `PublishConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use medium_publish::config::{BRANCH_ENV, DEFAULT_API_BASE, DEFAULT_INDEX_FILE, DEFAULT_RAW_HOST, REPOSITORY_ENV};
use medium_publish::{
    find_posts, publish, publish_all, resolve_branch, resolve_token, rewrite_to_file,
    PublishConfig, PublishOutcome, PublishProgressCallback,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Progress bar for `publish --all`: one line per document above the bar.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} posts  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Publishing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl PublishProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_document_start(&self, _index: usize, _total: usize, path: &Path) {
        self.bar.set_message(post_name(path));
    }

    fn on_document_complete(&self, index: usize, total: usize, path: &Path, outcome: &PublishOutcome) {
        let detail = match outcome {
            PublishOutcome::DryRun(report) => format!("dry run, {} chars", report.content_chars),
            PublishOutcome::Published { .. } => outcome.post_url().unwrap_or("draft created").to_string(),
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            post_name(path),
            dim(&detail)
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, path: &Path, error: &str) {
        let first_line = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            post_name(path),
            red(first_line)
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(success_count);
        if failed == 0 {
            eprintln!("{} {} post(s) processed", green("✔"), bold(&total.to_string()));
        } else {
            eprintln!(
                "{} {}/{} post(s) processed  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

/// `posts/<slug>/index.md` → `<slug>`.
fn post_name(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Rewrite image paths only; writes posts/my-post/medium.md
  medium-publish prepare --md posts/my-post/index.md --repo owner/repo

  # Dry run (no MEDIUM_TOKEN set)
  medium-publish publish --md posts/my-post/index.md --repo owner/repo

  # Create a draft on Medium
  MEDIUM_TOKEN=... medium-publish publish --md posts/my-post/index.md

  # Every posts/<slug>/index.md
  medium-publish publish --all posts --dry-run

ENVIRONMENT VARIABLES:
  MEDIUM_TOKEN              Medium integration token (checked first)
  MEDIUM_INTEGRATION_TOKEN  Legacy token variable (fallback)
  GITHUB_REPOSITORY         owner/repo used in raw image URLs
  GITHUB_REF_NAME           Branch used in raw image URLs (default: main)

Images must be committed and pushed for the raw URLs to resolve on Medium.
"#;

/// Prepare rendered Markdown for Medium and submit it as a draft.
#[derive(Parser, Debug)]
#[command(
    name = "medium-publish",
    version,
    about = "Prepare rendered Markdown for Medium and submit it as a draft",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MEDIUM_PUBLISH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "MEDIUM_PUBLISH_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite local image references to raw GitHub URLs and write the result.
    Prepare(PrepareArgs),
    /// Prepare one or more posts and create Medium drafts (dry run without a token).
    Publish(PublishArgs),
}

/// Options shared by both subcommands.
#[derive(Args, Debug)]
struct RepoArgs {
    /// Branch the images are committed on.
    #[arg(long, env = BRANCH_ENV)]
    branch: Option<String>,

    /// Repository root. Default: nearest ancestor containing .git.
    #[arg(long, env = "MEDIUM_PUBLISH_REPO_ROOT")]
    repo_root: Option<PathBuf>,

    /// Host prefix of generated image URLs.
    #[arg(long, env = "MEDIUM_PUBLISH_RAW_HOST", default_value = DEFAULT_RAW_HOST)]
    raw_host: String,
}

#[derive(Args, Debug)]
struct PrepareArgs {
    /// Path to the rendered Markdown (GFM) file.
    #[arg(long)]
    md: PathBuf,

    /// GitHub repository, owner/repo.
    #[arg(long)]
    repo: String,

    /// Output path. Default: medium.md next to the input.
    #[arg(short, long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    repo_args: RepoArgs,
}

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("input").required(true).args(["md", "all"])))]
struct PublishArgs {
    /// Path to the rendered Markdown (GFM) file.
    #[arg(long)]
    md: Option<PathBuf>,

    /// Publish every <DIR>/<slug>/<index-name>.
    #[arg(long, value_name = "DIR")]
    all: Option<PathBuf>,

    /// Index file name looked for with --all.
    #[arg(long, default_value = DEFAULT_INDEX_FILE)]
    index_name: String,

    /// GitHub repository, owner/repo.
    #[arg(long, env = REPOSITORY_ENV)]
    repo: Option<String>,

    /// Tag used when the front matter has none (repeatable). Replaces the built-in list.
    #[arg(long = "default-tag", value_name = "TAG", env = "MEDIUM_DEFAULT_TAGS", value_delimiter = ',')]
    default_tags: Vec<String>,

    /// Report what would be published even when a token is set.
    #[arg(long)]
    dry_run: bool,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    /// Medium API base URL.
    #[arg(long, env = "MEDIUM_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Identity lookup timeout in seconds.
    #[arg(long, default_value_t = 30)]
    identity_timeout: u64,

    /// Post creation timeout in seconds.
    #[arg(long, default_value_t = 60)]
    post_timeout: u64,

    #[command(flatten)]
    repo_args: RepoArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Prepare(args) => run_prepare(args, cli.quiet).await,
        Command::Publish(args) => run_publish(args, cli.quiet).await,
    }
}

async fn run_prepare(args: PrepareArgs, quiet: bool) -> Result<()> {
    let mut builder = PublishConfig::builder()
        .repo(args.repo.as_str())
        .branch(resolve_branch(args.repo_args.branch.clone()))
        .raw_host(args.repo_args.raw_host.as_str());
    if let Some(ref root) = args.repo_args.repo_root {
        builder = builder.repo_root(root);
    }
    let config = builder.build().context("Invalid configuration")?;
    // Reject an empty --repo before reading anything.
    config.require_repo().context("Invalid configuration")?;

    let summary = rewrite_to_file(&args.md, args.out.as_deref(), &config)
        .await
        .context("Rewrite failed")?;

    if !quiet {
        eprintln!(
            "{}  {} image(s) rewritten, {} kept  →  {}",
            green("✔"),
            summary.rewritten_images,
            summary.kept_images,
            bold(&summary.output_path.display().to_string()),
        );
    }
    Ok(())
}

async fn run_publish(args: PublishArgs, quiet: bool) -> Result<()> {
    let token = resolve_token(|name| std::env::var(name).ok());
    let show_progress = args.all.is_some() && !quiet && !args.json;

    let mut builder = PublishConfig::builder()
        .maybe_token(token)
        .branch(resolve_branch(args.repo_args.branch.clone()))
        .raw_host(args.repo_args.raw_host.as_str())
        .api_base_url(args.api_base.as_str())
        .identity_timeout_secs(args.identity_timeout)
        .post_timeout_secs(args.post_timeout)
        .dry_run(args.dry_run)
        .index_file_name(args.index_name.as_str());
    if let Some(ref repo) = args.repo {
        builder = builder.repo(repo.as_str());
    }
    if !args.default_tags.is_empty() {
        builder = builder.default_tags(args.default_tags.iter().map(String::as_str));
    }
    if let Some(ref root) = args.repo_args.repo_root {
        builder = builder.repo_root(root);
    }
    if show_progress {
        builder = builder.progress_callback(CliProgressCallback::new());
    }
    let config = builder.build().context("Invalid configuration")?;

    if config.token.is_none() && !quiet {
        eprintln!(
            "{} MEDIUM_TOKEN not set, skipping actual publish. Dry-run only.",
            cyan("◆")
        );
    }

    // ── Single document ──────────────────────────────────────────────────
    if let Some(ref md) = args.md {
        let outcome = publish(md, &config).await.context("Publish failed")?;
        print_outcome(&outcome, args.json)?;
        return Ok(());
    }

    // ── Every post under a directory ─────────────────────────────────────
    let Some(ref posts_dir) = args.all else {
        anyhow::bail!("either --md or --all is required");
    };
    let paths = find_posts(posts_dir, &config.index_file_name)
        .with_context(|| format!("Failed to list posts in {}", posts_dir.display()))?;
    if paths.is_empty() {
        if !quiet {
            eprintln!("No posts found under {}", posts_dir.display());
        }
        return Ok(());
    }

    let results = publish_all(&paths, &config).await;
    let mut failed = 0usize;
    for (path, result) in paths.iter().zip(&results) {
        match result {
            Ok(outcome) => print_outcome(outcome, args.json)?,
            Err(e) => {
                failed += 1;
                if !show_progress {
                    eprintln!("{} {}: {}", red("✗"), path.display(), e);
                }
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed}/{} post(s) failed", paths.len());
    }
    Ok(())
}

fn print_outcome(outcome: &PublishOutcome, json: bool) -> Result<()> {
    match outcome {
        PublishOutcome::Published { response } => {
            println!(
                "{}",
                serde_json::to_string_pretty(response).context("Failed to serialise response")?
            );
        }
        PublishOutcome::DryRun(report) if json => {
            println!(
                "{}",
                serde_json::to_string_pretty(report).context("Failed to serialise report")?
            );
        }
        PublishOutcome::DryRun(report) => println!("{report}"),
    }
    Ok(())
}
