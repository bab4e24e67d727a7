use crate::executor::FailureCause;
use crate::FailureReason;

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Elapsed time for progress messages, e.g. `1m 30s`
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Media length as a clock, `m:ss` or `h:mm:ss`
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Reduce a title to a filesystem-safe label: word characters and dashes
/// joined by underscores, at most 60 characters.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX_CHARS: usize = 60;

    let cleaned: String = filename
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(MAX_CHARS)
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

/// `{label}_{timestamp}_{8 hex}.{extension}`, unique per call
pub fn output_file_name(label: &str, extension: &str) -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let random_suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();

    let label = sanitize_filename(label);
    let label = if label.is_empty() { "download".to_string() } else { label };

    format!("{}_{}_{}.{}", label, timestamp, random_suffix, extension)
}

/// One-line, user-facing explanation of a failed download
pub fn describe_failure(reason: &FailureReason) -> String {
    let hint = match reason.root() {
        FailureReason::ClassificationUnsupported => "this URL is not supported",
        FailureReason::ExecutionTimeout => "the platform was too slow to respond, try again later",
        FailureReason::VerificationFailed => "no usable file was produced",
        FailureReason::ExecutionFailed { cause } => match cause {
            FailureCause::Blocked | FailureCause::BotDetected => {
                "the platform is blocking automated downloads, try again later"
            }
            FailureCause::Private => "the content is private or requires login",
            FailureCause::RegionLocked => "the content is not available in this region",
            FailureCause::Unavailable => "the content was removed or does not exist",
            FailureCause::Unsupported => "this URL is not supported",
            FailureCause::ToolMissing => "yt-dlp or ffmpeg is not installed",
            FailureCause::Unknown => "the extractor failed for an unknown reason",
        },
        _ => "the download failed",
    };

    format!("{} ({})", reason, hint)
}

/// Check if the current environment has required tools
pub async fn check_dependencies(extractor: &str, transcoder: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(extractor).await {
        missing.push(format!("{} - required for every download", extractor));
    }

    if !check_command_available(transcoder).await {
        missing.push(format!("{} - required for Instagram audio and format merging", transcoder));
    }

    missing
}

/// Check if a command is available in PATH
pub async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    let probe = if command.contains("ffmpeg") { "-version" } else { "--version" };

    Command::new(command)
        .arg(probe)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::strategies::MediaKind;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(5), "0:05");
        assert_eq!(format_clock(212), "3:32");
        assert_eq!(format_clock(3725), "1:02:05");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Hello World!"), "Hello_World");
        assert_eq!(sanitize_filename("test/file?name"), "test_file_name");
        assert_eq!(sanitize_filename("  spaced  "), "spaced");
        assert_eq!(sanitize_filename("Speedrun: Any%"), "Speedrun_Any");
        assert_eq!(sanitize_filename("???"), "");
        assert_eq!(sanitize_filename(&"a".repeat(100)).len(), 60);
    }

    #[test]
    fn test_output_file_name_shape() {
        let name = output_file_name("tiktok", "mp4");
        let parts: Vec<&str> = name.trim_end_matches(".mp4").split('_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "tiktok");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(parts[3].len(), 8);
        assert!(parts[3].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(output_file_name("tiktok", "mp4"), name);

        assert!(output_file_name("!!!", "mp3").starts_with("download_"));
    }

    #[test]
    fn test_describe_failure_uses_root_cause() {
        let reason = FailureReason::ExhaustedFailed {
            platform: Platform::Instagram,
            kind: MediaKind::Video,
            last: Box::new(FailureReason::ExecutionFailed { cause: FailureCause::Private }),
        };
        assert!(describe_failure(&reason).contains("private or requires login"));
        assert!(describe_failure(&FailureReason::ClassificationUnsupported).contains("not supported"));
    }

    #[tokio::test]
    async fn test_missing_command_is_reported() {
        let missing = check_dependencies("definitely-not-a-real-binary-xyz", "also-not-real-xyz").await;
        assert_eq!(missing.len(), 2);
        assert!(!check_command_available("definitely-not-a-real-binary-xyz").await);
    }
}
