use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External media extractor (yt-dlp)
    pub extractor: ExtractorConfig,

    /// External transcoder (ffmpeg)
    pub transcoder: TranscoderConfig,

    /// Pacing between strategy attempts
    pub retry: RetryConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Program name or path of the extractor
    pub program: String,

    /// Ceiling passed as `--max-filesize` to every strategy, in megabytes
    pub max_filesize_mb: u32,

    /// Wall-clock budget for one attempt
    pub timeout_secs: u64,

    /// Budget for platforms whose strategies pace their own requests
    pub extended_timeout_secs: u64,

    /// Output files must be strictly larger than this to count
    pub min_file_bytes: u64,

    /// Bytes kept from each of stdout and stderr per attempt
    pub capture_limit_bytes: usize,

    /// Budget for a metadata lookup
    pub metadata_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderConfig {
    pub program: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Fixed pause between two attempts
    pub delay_ms: u64,

    /// Upper bound of the random extra pause added to `delay_ms`
    pub jitter_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory downloads are written to (defaults to ./downloads)
    pub downloads_dir: Option<PathBuf>,

    /// How long a handed-off file survives before it is deleted
    pub retention_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            max_filesize_mb: 100,
            timeout_secs: 120,
            extended_timeout_secs: 240,
            min_file_bytes: 1000,
            capture_limit_bytes: 20 * 1024 * 1024,
            metadata_timeout_secs: 25,
        }
    }
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            jitter_ms: 500,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            downloads_dir: None,
            retention_secs: 5,
        }
    }
}

impl ExtractorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn extended_timeout(&self) -> Duration {
        Duration::from_secs(self.extended_timeout_secs)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }
}

impl TranscoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }
}

impl Config {
    /// Load configuration from file or create default.
    ///
    /// An explicit path wins; otherwise `./config.yaml`, then the user config dir.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            tracing::debug!("Wrote default configuration to {}", config_path.display());
            Ok(config)
        }
    }

    /// Parse and validate a configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("multigrab").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.extractor.program.trim().is_empty() {
            anyhow::bail!("extractor.program must not be empty");
        }
        if self.transcoder.program.trim().is_empty() {
            anyhow::bail!("transcoder.program must not be empty");
        }
        if self.extractor.max_filesize_mb == 0 {
            anyhow::bail!("extractor.max_filesize_mb must be positive");
        }
        if self.extractor.timeout_secs == 0
            || self.extractor.extended_timeout_secs == 0
            || self.transcoder.timeout_secs == 0
        {
            anyhow::bail!("timeouts must be at least one second");
        }
        if self.extractor.capture_limit_bytes == 0 {
            anyhow::bail!("extractor.capture_limit_bytes must be positive");
        }
        if self.retry.delay_ms > 60_000 || self.retry.jitter_ms > 60_000 {
            anyhow::bail!("retry delays must stay under one minute");
        }

        Ok(())
    }

    /// Directory downloads are written to
    pub fn downloads_dir(&self) -> PathBuf {
        self.app
            .downloads_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("downloads"))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.app.retention_secs)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Extractor: {}", self.extractor.program);
        println!("  Transcoder: {}", self.transcoder.program);
        println!("  Max File Size: {} MB", self.extractor.max_filesize_mb);
        println!(
            "  Attempt Timeout: {}s (extended {}s)",
            self.extractor.timeout_secs, self.extractor.extended_timeout_secs
        );
        println!("  Minimum File Size: {} bytes", self.extractor.min_file_bytes);
        println!("  Retry Delay: {}ms (+ up to {}ms)", self.retry.delay_ms, self.retry.jitter_ms);
        println!("  Downloads Directory: {}", self.downloads_dir().display());
        println!("  Retention: {}s", self.app.retention_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.downloads_dir(), PathBuf::from("downloads"));
        assert_eq!(config.extractor.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs_err::write(&path, "extractor:\n  max_filesize_mb: 50\nretry:\n  delay_ms: 0\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.extractor.max_filesize_mb, 50);
        assert_eq!(config.extractor.program, "yt-dlp");
        assert_eq!(config.retry.delay_ms, 0);
        assert_eq!(config.retry.jitter_ms, 500);
        assert_eq!(config.transcoder.program, "ffmpeg");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs_err::write(&path, "extractor:\n  timeout_secs: 0\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[tokio::test]
    async fn test_load_writes_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = Config::load(Some(&path)).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.extractor.max_filesize_mb, 100);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.app.retention_secs, config.app.retention_secs);
    }
}
