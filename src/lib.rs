//! Multigrab - A Rust CLI tool for downloading media from social platforms
//!
//! This library drives an external extractor (yt-dlp) and transcoder (ffmpeg)
//! through ordered, platform-specific fallback strategies, verifying each
//! attempt on disk and cleaning up whatever a failed attempt leaves behind.

use serde::{Deserialize, Serialize};

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod executor;
pub mod metadata;
pub mod orchestrator;
pub mod platform;
pub mod strategies;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use executor::{Executor, FailureCause, ProcessExecutor};
pub use metadata::Metadata;
pub use orchestrator::{DownloadOutcome, Downloader};
pub use platform::Platform;
pub use strategies::{Catalog, Descriptor, MediaKind, Plan};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Stage of the fetch-then-transcode pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Fetch,
    Transcode,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Fetch => write!(f, "fetch"),
            PipelineStage::Transcode => write!(f, "transcode"),
        }
    }
}

/// Why a download did not produce a file.
///
/// Attempt-level kinds (`ExecutionTimeout`, `ExecutionFailed`,
/// `VerificationFailed`) never leave the orchestrator on their own; they are
/// carried inside `ExhaustedFailed` or `PipelineStageFailed`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("URL is not supported by any extractor")]
    ClassificationUnsupported,

    #[error("attempt exceeded its time budget")]
    ExecutionTimeout,

    #[error("extractor exited with an error ({cause})")]
    ExecutionFailed { cause: FailureCause },

    #[error("no acceptably sized output file was produced")]
    VerificationFailed,

    #[error("{stage} stage failed: {reason}")]
    PipelineStageFailed {
        stage: PipelineStage,
        reason: Box<FailureReason>,
    },

    #[error("all {platform} {kind} strategies failed: {last}")]
    ExhaustedFailed {
        platform: Platform,
        kind: MediaKind,
        last: Box<FailureReason>,
    },
}

impl FailureReason {
    /// How much a reason tells a human about what went wrong.
    ///
    /// A diagnosed extractor error beats a timeout, which beats an
    /// undiagnosed error, which beats a silent missing file.
    pub fn specificity(&self) -> u8 {
        match self {
            FailureReason::VerificationFailed => 0,
            FailureReason::ExecutionFailed { cause: FailureCause::Unknown } => 1,
            FailureReason::ExecutionTimeout => 2,
            FailureReason::ExecutionFailed { .. } => 3,
            FailureReason::ClassificationUnsupported => 4,
            FailureReason::PipelineStageFailed { .. } | FailureReason::ExhaustedFailed { .. } => 5,
        }
    }

    /// The innermost attempt-level reason
    pub fn root(&self) -> &FailureReason {
        match self {
            FailureReason::PipelineStageFailed { reason, .. } => reason.root(),
            FailureReason::ExhaustedFailed { last, .. } => last.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unwraps_nested_reasons() {
        let reason = FailureReason::PipelineStageFailed {
            stage: PipelineStage::Fetch,
            reason: Box::new(FailureReason::ExhaustedFailed {
                platform: Platform::Instagram,
                kind: MediaKind::Video,
                last: Box::new(FailureReason::ExecutionTimeout),
            }),
        };
        assert_eq!(reason.root(), &FailureReason::ExecutionTimeout);
    }

    #[test]
    fn test_diagnosed_failure_outranks_missing_file() {
        let diagnosed = FailureReason::ExecutionFailed { cause: FailureCause::Private };
        assert!(diagnosed.specificity() > FailureReason::ExecutionTimeout.specificity());
        assert!(FailureReason::ExecutionTimeout.specificity() > FailureReason::VerificationFailed.specificity());
    }

    #[test]
    fn test_failure_reason_serializes_with_type_tag() {
        let reason = FailureReason::ExhaustedFailed {
            platform: Platform::Tiktok,
            kind: MediaKind::Audio,
            last: Box::new(FailureReason::VerificationFailed),
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["type"], "exhausted_failed");
        assert_eq!(json["platform"], "tiktok");
        assert_eq!(json["kind"], "audio");
        assert_eq!(json["last"]["type"], "verification_failed");
    }

    #[test]
    fn test_display_mentions_platform_and_kind() {
        let reason = FailureReason::ExhaustedFailed {
            platform: Platform::Facebook,
            kind: MediaKind::Video,
            last: Box::new(FailureReason::ExecutionFailed { cause: FailureCause::Private }),
        };
        let message = reason.to_string();
        assert!(message.contains("Facebook"));
        assert!(message.contains("video"));
    }
}
