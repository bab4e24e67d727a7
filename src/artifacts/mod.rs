//! Files an attempt may leave behind, and what to do with them.
//!
//! Everything here is derived from one expected output path. Nothing ever
//! lists or sweeps a directory, so concurrent downloads sharing the same
//! directory never touch each other's files.

use std::path::{Path, PathBuf};

pub mod cleanup;
pub mod verify;

pub use cleanup::Cleaner;
pub use verify::Verifier;

/// Container -> containers the same download may show up as instead
pub const SIBLING_EXTENSIONS: &[(&str, &[&str])] = &[
    ("mp4", &["webm", "mkv", "mov"]),
    ("mp3", &["m4a", "webm", "opus", "ogg"]),
];

/// Suffixes yt-dlp and ffmpeg use for in-progress files
const SCRATCH_SUFFIXES: &[&str] = &["part", "ytdl", "tmp"];

pub fn sibling_extensions(extension: &str) -> &'static [&'static str] {
    let extension = extension.to_lowercase();
    SIBLING_EXTENSIONS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, siblings)| *siblings)
        .unwrap_or(&[])
}

/// Alternate-extension variants of `expected`, in preference order
pub fn siblings(expected: &Path) -> Vec<PathBuf> {
    let extension = expected
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    sibling_extensions(&extension)
        .iter()
        .map(|alt| expected.with_extension(alt))
        .collect()
}

/// In-progress leftovers for `expected` and each of its siblings:
/// `name.mp4.part`, `name.mp4.ytdl`, `name.part`, `name.tmp`, ...
pub fn scratch_leftovers(expected: &Path) -> Vec<PathBuf> {
    let mut leftovers = Vec::new();

    for candidate in std::iter::once(expected.to_path_buf()).chain(siblings(expected)) {
        for suffix in SCRATCH_SUFFIXES {
            let mut name = candidate.as_os_str().to_owned();
            name.push(".");
            name.push(suffix);
            leftovers.push(PathBuf::from(name));
        }
    }

    for suffix in SCRATCH_SUFFIXES {
        leftovers.push(expected.with_extension(suffix));
    }

    leftovers
}

/// Every path an attempt targeting `expected` may have written
pub fn owned_paths(expected: &Path) -> Vec<PathBuf> {
    std::iter::once(expected.to_path_buf())
        .chain(siblings(expected))
        .chain(scratch_leftovers(expected))
        .collect()
}
