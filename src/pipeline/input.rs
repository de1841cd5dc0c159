//! Input resolution: load the document and locate its repository.
//!
//! The document path is canonicalised so that relative image targets and
//! the repository root are compared in the same (absolute, symlink-free)
//! form. A missing file is the one precondition failure of the pipeline and
//! is reported before any network activity.

use crate::error::PublishError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A loaded Markdown document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Canonical path of the file.
    pub path: PathBuf,
    /// Full UTF-8 contents.
    pub raw_text: String,
}

impl Document {
    /// File name without extension (`index` for `posts/p1/index.md`).
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory containing the document.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }
}

/// Read `path` as UTF-8 text.
pub async fn load_document(path: &Path) -> Result<Document, PublishError> {
    let canonical = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| map_io(path, e))?;
    if !canonical.is_file() {
        return Err(PublishError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = tokio::fs::read(&canonical)
        .await
        .map_err(|e| map_io(path, e))?;
    let raw_text = String::from_utf8(bytes).map_err(|_| PublishError::NotUtf8 {
        path: path.to_path_buf(),
    })?;

    debug!(
        "Loaded {} ({} bytes)",
        canonical.display(),
        raw_text.len()
    );
    Ok(Document {
        path: canonical,
        raw_text,
    })
}

/// Repository root for a document in `start`.
///
/// Uses `configured` when given (canonicalised if it exists). Otherwise walks
/// up from `start` to the first directory containing `.git`, falling back to
/// the current working directory.
pub fn resolve_repo_root(configured: Option<&Path>, start: &Path) -> Result<PathBuf, PublishError> {
    if let Some(root) = configured {
        return Ok(std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf()));
    }
    if let Some(found) = discover_repo_root(start) {
        debug!("Discovered repository root {}", found.display());
        return Ok(found);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| PublishError::Internal(format!("current directory unavailable: {e}")))?;
    debug!(
        "No .git above {}; using {} as repository root",
        start.display(),
        cwd.display()
    );
    Ok(std::fs::canonicalize(&cwd).unwrap_or(cwd))
}

/// First ancestor of `start` (inclusive) that contains a `.git` entry.
pub fn discover_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn map_io(path: &Path, e: std::io::Error) -> PublishError {
    match e.kind() {
        ErrorKind::NotFound => PublishError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => PublishError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => PublishError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_file_not_found() {
        let err = load_document(Path::new("/definitely/not/here/index.md"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn directory_is_not_a_document() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(dir.path()).await.unwrap_err();
        assert!(matches!(err, PublishError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn non_utf8_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = load_document(&path).await.unwrap_err();
        assert!(matches!(err, PublishError::NotUtf8 { .. }));
    }

    #[tokio::test]
    async fn loads_and_canonicalises() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("posts/p1")).unwrap();
        let path = dir.path().join("posts/p1/index.md");
        std::fs::write(&path, "# Hi\n").unwrap();

        let doc = load_document(&dir.path().join("posts/./p1/../p1/index.md"))
            .await
            .unwrap();
        assert_eq!(doc.raw_text, "# Hi\n");
        assert_eq!(doc.stem(), "index");
        assert!(doc.path.is_absolute());
        assert!(doc.dir().ends_with("posts/p1"));
    }

    #[test]
    fn discovers_git_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::create_dir_all(dir.path().join("posts/p1")).unwrap();
        let found = discover_repo_root(&dir.path().join("posts/p1")).unwrap();
        assert_eq!(found, dir.path());
    }

    #[test]
    fn configured_root_wins() {
        let dir = tempfile::tempdir().unwrap();
        let root = resolve_repo_root(Some(dir.path()), Path::new("/elsewhere")).unwrap();
        assert_eq!(root, std::fs::canonicalize(dir.path()).unwrap());
    }
}
