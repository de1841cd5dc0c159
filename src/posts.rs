//! Post discovery: find the document of every post under a posts directory.
//!
//! A post is an immediate subdirectory of the posts directory that contains
//! the index file (`posts/<slug>/index.md`). Anything else is ignored.

use crate::error::PublishError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Index files of every post directly below `posts_dir`, sorted by path.
pub fn find_posts(posts_dir: &Path, index_file_name: &str) -> Result<Vec<PathBuf>, PublishError> {
    if !posts_dir.is_dir() {
        return Err(PublishError::FileNotFound {
            path: posts_dir.to_path_buf(),
        });
    }
    let entries = std::fs::read_dir(posts_dir).map_err(|e| PublishError::ReadFailed {
        path: posts_dir.to_path_buf(),
        source: e,
    })?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PublishError::ReadFailed {
            path: posts_dir.to_path_buf(),
            source: e,
        })?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let index = dir.join(index_file_name);
        if index.is_file() {
            debug!("Found post: {}", dir.display());
            found.push(index);
        }
    }
    found.sort();
    Ok(found)
}
