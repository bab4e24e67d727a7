use std::path::Path;
use tokio::fs;

use super::{siblings, Cleaner};

/// Decides whether an attempt produced a usable file
#[derive(Debug, Clone)]
pub struct Verifier {
    min_bytes: u64,
}

impl Verifier {
    /// Files must be strictly larger than `min_bytes`
    pub fn new(min_bytes: u64) -> Self {
        Self { min_bytes }
    }

    /// Check `expected`, adopting a sibling-extension variant if needed.
    ///
    /// Missing files are a normal outcome and yield `false`. On success the
    /// remaining siblings are removed so only `expected` is left.
    pub async fn verify(&self, expected: &Path) -> bool {
        if !is_file(expected).await {
            for sibling in siblings(expected) {
                if !is_file(&sibling).await {
                    continue;
                }
                match fs::rename(&sibling, expected).await {
                    Ok(()) => {
                        tracing::debug!("Adopted {} as {}", sibling.display(), expected.display());
                        break;
                    }
                    Err(e) => tracing::warn!("Could not rename {}: {}", sibling.display(), e),
                }
            }
        }

        let size = match fs::metadata(expected).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return false,
        };

        if size <= self.min_bytes {
            tracing::debug!("{} is only {} bytes, rejecting", expected.display(), size);
            return false;
        }

        Cleaner.clean_siblings(expected).await;
        true
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}
