use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::config::Config;
use crate::platform::{self, Platform};
use crate::utils;
use crate::Result;

const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

/// Descriptive information about a media URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub uploader: String,
    pub thumbnail: Option<String>,
    pub duration_seconds: Option<u64>,
    /// `m:ss` or `h:mm:ss`, absent when the duration is unknown
    pub duration_label: Option<String>,
    pub platform: Platform,
    pub view_count: Option<u64>,
    /// `YYYYMMDD` as reported by the extractor
    pub upload_date: Option<String>,
}

/// Looks up titles and thumbnails without downloading media
pub struct MetadataFetcher {
    client: reqwest::Client,
    extractor_program: String,
    timeout: Duration,
}

impl MetadataFetcher {
    pub fn new(extractor_program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            extractor_program: extractor_program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.extractor.program.clone(), config.extractor.metadata_timeout())
    }

    /// Best-effort lookup; `None` when every source failed
    pub async fn fetch(&self, url: &str) -> Option<Metadata> {
        let url = platform::clean_url(url);
        let platform = platform::classify(&url);

        if platform == Platform::Youtube {
            match self.fetch_oembed(&url).await {
                Ok(metadata) => return Some(metadata),
                Err(e) => tracing::debug!("oEmbed lookup failed: {:#}", e),
            }
        }

        match self.fetch_dump(&url, platform).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!("Metadata lookup failed for {}: {:#}", url, e);
                None
            }
        }
    }

    async fn fetch_oembed(&self, url: &str) -> Result<Metadata> {
        let endpoint = format!("{}?url={}&format=json", OEMBED_ENDPOINT, urlencoding::encode(url));

        let response = self
            .client
            .get(&endpoint)
            .timeout(self.timeout)
            .send()
            .await
            .context("oEmbed request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("oEmbed returned HTTP {}", response.status());
        }

        let body: Value = response.json().await.context("oEmbed response was not JSON")?;
        parse_oembed(&body)
    }

    async fn fetch_dump(&self, url: &str, platform: Platform) -> Result<Metadata> {
        tracing::debug!("Extracting metadata with {} for: {}", self.extractor_program, url);

        let mut command = Command::new(&self.extractor_program);
        command
            .args(["--dump-json", "--no-download", "--no-playlist", "--no-warnings", "--socket-timeout", "20", url])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| anyhow::anyhow!("metadata lookup timed out after {}s", self.timeout.as_secs()))?
            .with_context(|| format!("failed to run {}", self.extractor_program))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} failed: {}", self.extractor_program, error.trim());
        }

        let info: Value = serde_json::from_slice(&output.stdout).context("extractor output was not JSON")?;
        Ok(parse_dump(&info, platform))
    }
}

fn parse_oembed(body: &Value) -> Result<Metadata> {
    let title = body["title"]
        .as_str()
        .filter(|t| !t.is_empty())
        .context("oEmbed response has no title")?;

    Ok(Metadata {
        title: title.to_string(),
        uploader: body["author_name"].as_str().unwrap_or("YouTube User").to_string(),
        thumbnail: body["thumbnail_url"].as_str().map(str::to_string),
        duration_seconds: None,
        duration_label: None,
        platform: Platform::Youtube,
        view_count: None,
        upload_date: None,
    })
}

/// Map an extractor `--dump-json` document onto `Metadata`
pub fn parse_dump(info: &Value, platform: Platform) -> Metadata {
    let text = |key: &str| info[key].as_str().filter(|s| !s.is_empty()).map(str::to_string);

    let duration_seconds = info["duration"].as_f64().filter(|d| *d > 0.0).map(|d| d as u64);

    Metadata {
        title: text("title").unwrap_or_else(|| format!("{} Video", platform.display_name())),
        uploader: text("uploader")
            .or_else(|| text("channel"))
            .or_else(|| text("creator"))
            .unwrap_or_else(|| format!("{} User", platform.display_name())),
        thumbnail: best_thumbnail(info).or_else(|| text("thumbnail")),
        duration_seconds,
        duration_label: duration_seconds.map(utils::format_clock),
        platform,
        view_count: info["view_count"].as_u64(),
        upload_date: text("upload_date"),
    }
}

/// Widest entry of the `thumbnails` array
pub fn best_thumbnail(info: &Value) -> Option<String> {
    info["thumbnails"]
        .as_array()?
        .iter()
        .filter_map(|t| Some((t["width"].as_u64().unwrap_or(0), t["url"].as_str()?)))
        .max_by_key(|(width, _)| *width)
        .map(|(_, url)| url.to_string())
}
