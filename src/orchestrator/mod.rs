use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::artifacts::{Cleaner, Verifier};
use crate::config::Config;
use crate::executor::{Executor, FailureCause, ProcessExecutor};
use crate::platform::{self, Platform};
use crate::strategies::{Catalog, Descriptor, MediaKind, Plan};
use crate::utils;
use crate::{FailureReason, PipelineStage};

/// Result of one top-level download request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub success: bool,
    pub filepath: Option<PathBuf>,
    pub platform: Platform,
    pub kind: MediaKind,
    /// Name of the strategy that produced the file
    pub strategy: Option<String>,
    /// Executor invocations made, across all stages
    pub attempts: usize,
    pub error: Option<FailureReason>,
}

impl DownloadOutcome {
    pub fn succeeded(platform: Platform, kind: MediaKind, filepath: PathBuf, strategy: String, attempts: usize) -> Self {
        Self {
            success: true,
            filepath: Some(filepath),
            platform,
            kind,
            strategy: Some(strategy),
            attempts,
            error: None,
        }
    }

    pub fn failed(platform: Platform, kind: MediaKind, reason: FailureReason, attempts: usize) -> Self {
        Self {
            success: false,
            filepath: None,
            platform,
            kind,
            strategy: None,
            attempts,
            error: Some(reason),
        }
    }
}

/// Waits between two attempts of the same ladder
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Pacer that actually sleeps
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Inter-attempt delay: a fixed base plus up to `jitter` extra
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub base: Duration,
    pub jitter: Duration,
}

impl Backoff {
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base;
        }
        self.base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            jitter: Duration::from_millis(500),
        }
    }
}

struct LadderSuccess {
    strategy: String,
    attempts: usize,
}

struct LadderFailure {
    reason: FailureReason,
    attempts: usize,
}

/// Drives classification, strategy selection and the attempt loop
pub struct Downloader<E = ProcessExecutor, P = TokioPacer> {
    catalog: Catalog,
    executor: E,
    pacer: P,
    verifier: Verifier,
    cleaner: Cleaner,
    backoff: Backoff,
    downloads_dir: PathBuf,
}

impl Downloader<ProcessExecutor, TokioPacer> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Catalog::from_config(config),
            ProcessExecutor::new(config.extractor.capture_limit_bytes),
            TokioPacer,
            Verifier::new(config.extractor.min_file_bytes),
            Backoff {
                base: config.retry.delay(),
                jitter: config.retry.jitter(),
            },
            config.downloads_dir(),
        )
    }
}

impl<E: Executor, P: Pacer> Downloader<E, P> {
    pub fn new(
        catalog: Catalog,
        executor: E,
        pacer: P,
        verifier: Verifier,
        backoff: Backoff,
        downloads_dir: PathBuf,
    ) -> Self {
        Self {
            catalog,
            executor,
            pacer,
            verifier,
            cleaner: Cleaner,
            backoff,
            downloads_dir,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fresh, collision-free output path for one request
    pub fn output_path(&self, title: Option<&str>, platform: Platform, kind: MediaKind) -> PathBuf {
        let label = title.unwrap_or(platform.as_str());
        self.downloads_dir.join(utils::output_file_name(label, kind.extension()))
    }

    /// Download `url` as `kind`, naming the file after the platform
    pub async fn request_download(&self, url: &str, kind: MediaKind, quality: &str) -> DownloadOutcome {
        self.request_download_titled(url, kind, quality, None).await
    }

    /// Download `url` as `kind`, naming the file after `title` when known
    pub async fn request_download_titled(
        &self,
        url: &str,
        kind: MediaKind,
        quality: &str,
        title: Option<&str>,
    ) -> DownloadOutcome {
        let platform = platform::classify(url);

        if let Err(e) = tokio::fs::create_dir_all(&self.downloads_dir).await {
            tracing::warn!("Could not create {}: {}", self.downloads_dir.display(), e);
        }

        let output = self.output_path(title, platform, kind);
        self.download_to(url, kind, quality, &output).await
    }

    /// Run the whole state machine against a caller-chosen output path
    pub async fn download_to(&self, url: &str, kind: MediaKind, quality: &str, output: &Path) -> DownloadOutcome {
        let platform = platform::classify(url);
        tracing::info!("Starting {} {} download: {}", platform, kind, url);

        let plan = self.catalog.plan(platform, kind, quality, url, output);
        tracing::debug!("Selected plan with {} descriptor(s)", plan.len());

        match plan {
            Plan::Flat(descriptors) => self.run_flat(platform, kind, &descriptors, output).await,
            Plan::FetchThenTranscode { fetch, scratch, transcode } => {
                self.run_fetch_then_transcode(platform, kind, &fetch, &scratch, &transcode, output)
                    .await
            }
        }
    }

    async fn run_flat(
        &self,
        platform: Platform,
        kind: MediaKind,
        descriptors: &[Descriptor],
        output: &Path,
    ) -> DownloadOutcome {
        match self.attempt_ladder(descriptors, true).await {
            Ok(success) => {
                tracing::info!("Download succeeded with {}", success.strategy);
                DownloadOutcome::succeeded(platform, kind, output.to_path_buf(), success.strategy, success.attempts)
            }
            Err(failure) => {
                self.cleaner.clean(output).await;
                let reason = exhausted(platform, kind, failure.reason);
                tracing::warn!("{}", reason);
                DownloadOutcome::failed(platform, kind, reason, failure.attempts)
            }
        }
    }

    async fn run_fetch_then_transcode(
        &self,
        platform: Platform,
        kind: MediaKind,
        fetch: &[Descriptor],
        scratch: &Path,
        transcode: &[Descriptor],
        output: &Path,
    ) -> DownloadOutcome {
        tracing::info!("{} cannot deliver {} directly, fetching video first", platform, kind);

        let fetched = match self.attempt_ladder(fetch, true).await {
            Ok(success) => success,
            Err(failure) => {
                self.cleaner.clean(scratch).await;
                let reason = FailureReason::PipelineStageFailed {
                    stage: PipelineStage::Fetch,
                    reason: Box::new(exhausted(platform, MediaKind::Video, failure.reason)),
                };
                tracing::warn!("{}", reason);
                return DownloadOutcome::failed(platform, kind, reason, failure.attempts);
            }
        };

        tracing::info!("Fetched source video with {}, transcoding", fetched.strategy);
        let transcoded = self.attempt_ladder(transcode, false).await;

        // The scratch video never outlives the pipeline
        self.cleaner.clean(scratch).await;

        match transcoded {
            Ok(success) => {
                let strategy = format!("{} + {}", fetched.strategy, success.strategy);
                tracing::info!("Download succeeded with {}", strategy);
                DownloadOutcome::succeeded(platform, kind, output.to_path_buf(), strategy, fetched.attempts + success.attempts)
            }
            Err(failure) => {
                self.cleaner.clean(output).await;
                let reason = FailureReason::PipelineStageFailed {
                    stage: PipelineStage::Transcode,
                    reason: Box::new(failure.reason),
                };
                tracing::warn!("{}", reason);
                DownloadOutcome::failed(platform, kind, reason, fetched.attempts + failure.attempts)
            }
        }
    }

    /// Attempt descriptors in order until one verifies.
    ///
    /// Verification runs even after an executor error. Failed attempts are
    /// cleaned up before the next one; `paced` inserts the backoff between
    /// attempts but never after the last.
    async fn attempt_ladder(&self, descriptors: &[Descriptor], paced: bool) -> Result<LadderSuccess, LadderFailure> {
        let total = descriptors.len();
        let mut reason: Option<FailureReason> = None;

        for (index, descriptor) in descriptors.iter().enumerate() {
            tracing::info!("Trying strategy {}/{}: {}", index + 1, total, descriptor.name);

            let executed = self.executor.execute(descriptor).await;
            if let Err(e) = &executed {
                tracing::warn!("Strategy {} failed: {}", descriptor.name, e);
            }

            if self.verifier.verify(&descriptor.output).await {
                if executed.is_err() {
                    tracing::info!("{} reported an error but left a usable file", descriptor.name);
                }
                return Ok(LadderSuccess {
                    strategy: descriptor.name.clone(),
                    attempts: index + 1,
                });
            }

            let attempt_reason = match executed {
                Ok(()) => FailureReason::VerificationFailed,
                Err(e) => e.to_reason(),
            };
            let removed = self.cleaner.clean(&descriptor.output).await;
            if removed > 0 {
                tracing::debug!("Cleaned {} partial file(s) after {}", removed, descriptor.name);
            }

            // Ties go to the later attempt
            reason = match reason {
                Some(previous) if previous.specificity() > attempt_reason.specificity() => Some(previous),
                _ => Some(attempt_reason),
            };

            if paced && index + 1 < total {
                self.pacer.pause(self.backoff.next_delay()).await;
            }
        }

        Err(LadderFailure {
            reason: reason.unwrap_or(FailureReason::VerificationFailed),
            attempts: total,
        })
    }
}

/// Wrap the most telling attempt failure into the caller-facing reason
fn exhausted(platform: Platform, kind: MediaKind, last: FailureReason) -> FailureReason {
    if platform == Platform::Generic
        && last == (FailureReason::ExecutionFailed { cause: FailureCause::Unsupported })
    {
        return FailureReason::ClassificationUnsupported;
    }

    FailureReason::ExhaustedFailed {
        platform,
        kind,
        last: Box::new(last),
    }
}
