use anyhow::Context;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

use crate::Result;

/// Where a finished download is handed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Move the file to this path; a directory keeps the file name
    Path(PathBuf),
    /// Write the bytes to standard output
    Stdout,
}

impl Destination {
    /// `-` means standard output
    pub fn parse(value: &str) -> Self {
        if value == "-" {
            Destination::Stdout
        } else {
            Destination::Path(PathBuf::from(value))
        }
    }
}

/// Hand `path` to `destination`.
///
/// Returns the final location, or `None` when the bytes went to stdout and
/// the source file is left for the caller to remove.
pub async fn deliver(path: &Path, destination: &Destination) -> Result<Option<PathBuf>> {
    match destination {
        Destination::Stdout => {
            let mut stdout = tokio::io::stdout();
            stream_to(path, &mut stdout).await?;
            Ok(None)
        }
        Destination::Path(target) => {
            let target = resolve_target(path, target).await;
            move_file(path, &target).await?;
            Ok(Some(target))
        }
    }
}

/// Copy the file's bytes into `writer`
pub async fn stream_to<W: AsyncWrite + Unpin>(path: &Path, writer: &mut W) -> Result<u64> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let copied = tokio::io::copy(&mut file, writer)
        .await
        .with_context(|| format!("Failed to stream {}", path.display()))?;
    writer.flush().await?;

    Ok(copied)
}

/// Delete `path` once `grace` has elapsed, on a spawned task.
///
/// Returns at once. A caller that exits before the grace period ends must
/// await the handle, otherwise the file is never removed.
pub fn schedule_removal(path: PathBuf, grace: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!("Removed delivered file {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
        }
    })
}

async fn resolve_target(source: &Path, target: &Path) -> PathBuf {
    let is_dir = tokio::fs::metadata(target).await.map(|m| m.is_dir()).unwrap_or(false);
    match (is_dir, source.file_name()) {
        (true, Some(name)) => target.join(name),
        _ => target.to_path_buf(),
    }
}

async fn move_file(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    if tokio::fs::rename(source, target).await.is_ok() {
        return Ok(());
    }

    // Rename fails across filesystems
    tokio::fs::copy(source, target)
        .await
        .with_context(|| format!("Failed to copy {} to {}", source.display(), target.display()))?;
    tokio::fs::remove_file(source)
        .await
        .with_context(|| format!("Failed to remove {}", source.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_moves_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        let target_dir = dir.path().join("out");
        std::fs::create_dir(&target_dir).unwrap();
        std::fs::write(&source, b"media").unwrap();

        let delivered = deliver(&source, &Destination::Path(target_dir.clone())).await.unwrap();

        assert_eq!(delivered, Some(target_dir.join("clip.mp4")));
        assert!(!source.exists());
        assert_eq!(std::fs::read(target_dir.join("clip.mp4")).unwrap(), b"media");
    }

    #[tokio::test]
    async fn test_deliver_to_new_file_path_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp3");
        std::fs::write(&source, b"audio").unwrap();
        let target = dir.path().join("a").join("b").join("song.mp3");

        let delivered = deliver(&source, &Destination::Path(target.clone())).await.unwrap();
        assert_eq!(delivered, Some(target.clone()));
        assert!(target.exists());
    }

    #[tokio::test]
    async fn test_stream_to_writer() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp3");
        std::fs::write(&source, b"0123456789").unwrap();

        let mut sink: Vec<u8> = Vec::new();
        let copied = stream_to(&source, &mut sink).await.unwrap();
        assert_eq!(copied, 10);
        assert_eq!(sink, b"0123456789");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_schedule_removal_after_grace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"x").unwrap();

        let handle = schedule_removal(path.clone(), Duration::from_millis(50));
        assert!(path.exists());
        handle.await.unwrap();
        assert!(!path.exists());

        // Already gone is fine
        schedule_removal(path, Duration::ZERO).await.unwrap();
    }

    #[test]
    fn test_destination_parse() {
        assert_eq!(Destination::parse("-"), Destination::Stdout);
        assert_eq!(Destination::parse("out.mp4"), Destination::Path(PathBuf::from("out.mp4")));
    }
}
