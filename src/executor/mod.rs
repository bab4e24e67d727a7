use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

pub mod diagnostics;

pub use diagnostics::{diagnose, FailureCause};

use crate::strategies::Descriptor;
use crate::FailureReason;

/// Stderr kept in error messages, counted from the end
const STDERR_TAIL_CHARS: usize = 2000;

/// Why a single attempt did not complete
#[derive(thiserror::Error, Debug)]
pub enum ExecutionError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("exited with status {}: {stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    Failed { code: Option<i32>, stderr: String },
}

impl ExecutionError {
    /// Attempt-level failure kind for the orchestrator
    pub fn to_reason(&self) -> FailureReason {
        match self {
            ExecutionError::Spawn { .. } => FailureReason::ExecutionFailed {
                cause: FailureCause::ToolMissing,
            },
            ExecutionError::Timeout { .. } => FailureReason::ExecutionTimeout,
            ExecutionError::Failed { stderr, .. } => FailureReason::ExecutionFailed {
                cause: diagnose(stderr),
            },
        }
    }
}

/// Runs one descriptor's command to completion.
///
/// Implementations never retry; a returned error means the attempt is over.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, descriptor: &Descriptor) -> Result<(), ExecutionError>;
}

/// Executor backed by real child processes
pub struct ProcessExecutor {
    capture_limit: usize,
}

impl ProcessExecutor {
    /// `capture_limit` bounds the bytes kept from each output stream
    pub fn new(capture_limit: usize) -> Self {
        Self { capture_limit }
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(20 * 1024 * 1024)
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(&self, descriptor: &Descriptor) -> Result<(), ExecutionError> {
        let spec = &descriptor.command;

        if let Some(delay) = spec.pre_delay {
            tracing::debug!("Pausing {:?} before {}", delay, descriptor.name);
            tokio::time::sleep(delay).await;
        }

        tracing::debug!("Executing: {}", spec);

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own group, so helpers the extractor forks (ffmpeg) die with it
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| ExecutionError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        let pid = child.id();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.capture_limit;

        let run = async {
            let (out, err) = futures_util::future::join(
                drain_capped(stdout, limit),
                drain_capped(stderr, limit),
            )
            .await;
            let status = child.wait().await;
            (status, out, err)
        };

        let (status, stdout, stderr) = match tokio::time::timeout(spec.timeout, run).await {
            Ok(finished) => finished,
            Err(_) => {
                tracing::warn!("{} timed out after {:?}, killing", descriptor.name, spec.timeout);
                kill_group(pid);
                if let Err(e) = child.kill().await {
                    tracing::debug!("Kill after timeout failed: {}", e);
                }
                return Err(ExecutionError::Timeout { after: spec.timeout });
            }
        };

        let status = status.map_err(|source| ExecutionError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        if !stdout.is_empty() {
            tracing::trace!("{} stdout: {}", descriptor.name, String::from_utf8_lossy(&stdout));
        }

        if status.success() {
            return Ok(());
        }

        Err(ExecutionError::Failed {
            code: status.code(),
            stderr: tail(&String::from_utf8_lossy(&stderr), STDERR_TAIL_CHARS),
        })
    }
}

/// SIGKILL every process in the child's group
#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        tracing::debug!("Killing process group {} failed: {}", pid, e);
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

/// Read up to `limit` bytes, then discard the rest so the child never blocks
/// on a full pipe.
async fn drain_capped<R: AsyncRead + Unpin>(reader: Option<R>, limit: usize) -> Vec<u8> {
    let Some(mut reader) = reader else {
        return Vec::new();
    };

    let mut captured = Vec::new();
    if (&mut reader).take(limit as u64).read_to_end(&mut captured).await.is_err() {
        return captured;
    }

    let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
    captured
}

fn tail(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - max_chars).collect()
}
