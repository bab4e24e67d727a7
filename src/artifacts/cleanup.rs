use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{owned_paths, scratch_leftovers, siblings};

/// Removes what a failed attempt left behind.
///
/// Only paths derived from the expected output are touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cleaner;

impl Cleaner {
    /// Remove `expected`, its siblings and scratch leftovers.
    /// Returns how many files were deleted.
    pub async fn clean(&self, expected: &Path) -> usize {
        remove_all(owned_paths(expected)).await
    }

    /// Remove everything except `expected` itself
    pub async fn clean_siblings(&self, expected: &Path) -> usize {
        let paths: Vec<PathBuf> = siblings(expected)
            .into_iter()
            .chain(scratch_leftovers(expected))
            .collect();
        remove_all(paths).await
    }
}

async fn remove_all(paths: Vec<PathBuf>) -> usize {
    let mut removed = 0;
    for path in paths {
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Removed partial file {}", path.display());
                removed += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
        }
    }
    removed
}
