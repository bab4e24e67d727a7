use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub mod agents;
pub mod facebook;
pub mod generic;
pub mod instagram;
pub mod tiktok;
pub mod transcode;
pub mod twitch;
pub mod twitter;
pub mod youtube;
mod ytdlp;

pub use agents::{AgentProfile, FixedUserAgent, RandomUserAgents, UserAgentSource};

use crate::config::Config;
use crate::platform::Platform;
use ytdlp::Rung;

/// Requested output type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Container the final file is stored as
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

pub const VIDEO_HEIGHTS: &[u32] = &[1080, 720, 480, 360];
pub const AUDIO_BITRATES: &[u32] = &[320, 256, 192, 128];
pub const DEFAULT_VIDEO_HEIGHT: u32 = 720;
pub const DEFAULT_AUDIO_BITRATE: u32 = 320;

/// Parsed quality selector.
///
/// Video labels are height caps (`1080p`, `720p`, `480p`, `360p`), audio
/// labels are MP3 bitrates (`320kbps` .. `128kbps`). Anything else falls back
/// to 720p for video and 320kbps for audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Video { max_height: u32 },
    Audio { bitrate_kbps: u32 },
}

impl Quality {
    pub fn parse(kind: MediaKind, label: Option<&str>) -> Self {
        let digits = label.map(|l| {
            l.trim()
                .to_lowercase()
                .trim_end_matches("kbps")
                .trim_end_matches('k')
                .trim_end_matches('p')
                .to_string()
        });
        let value = digits.as_deref().and_then(|d| d.parse::<u32>().ok());

        match kind {
            MediaKind::Video => {
                let max_height = match value {
                    Some(h) if VIDEO_HEIGHTS.contains(&h) => h,
                    _ => {
                        if let Some(label) = label {
                            tracing::warn!("Unrecognised video quality '{}', using {}p", label, DEFAULT_VIDEO_HEIGHT);
                        }
                        DEFAULT_VIDEO_HEIGHT
                    }
                };
                Quality::Video { max_height }
            }
            MediaKind::Audio => {
                let bitrate_kbps = match value {
                    Some(b) if AUDIO_BITRATES.contains(&b) => b,
                    _ => {
                        if let Some(label) = label {
                            tracing::warn!("Unrecognised audio quality '{}', using {}kbps", label, DEFAULT_AUDIO_BITRATE);
                        }
                        DEFAULT_AUDIO_BITRATE
                    }
                };
                Quality::Audio { bitrate_kbps }
            }
        }
    }

    pub fn max_height(&self) -> u32 {
        match self {
            Quality::Video { max_height } => *max_height,
            Quality::Audio { .. } => DEFAULT_VIDEO_HEIGHT,
        }
    }

    pub fn bitrate_kbps(&self) -> u32 {
        match self {
            Quality::Audio { bitrate_kbps } => *bitrate_kbps,
            Quality::Video { .. } => DEFAULT_AUDIO_BITRATE,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Quality::Video { max_height } => format!("{}p", max_height),
            Quality::Audio { bitrate_kbps } => format!("{}kbps", bitrate_kbps),
        }
    }
}

/// A fully-formed external process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    /// Pause before spawning, for strategies that pace themselves
    pub pre_delay: Option<Duration>,
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// One attempt: a labelled command and the file it is expected to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub name: String,
    pub kind: MediaKind,
    pub output: PathBuf,
    pub command: CommandSpec,
}

impl Descriptor {
    /// Whether the arguments ask the extractor for audio extraction
    pub fn extracts_audio(&self) -> bool {
        self.command.args.iter().any(|a| a == "-x" || a == "-vn")
    }
}

/// How a request is carried out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Try each descriptor in order until one produces the file
    Flat(Vec<Descriptor>),
    /// Fetch video into a scratch file, then transcode it to the final audio file
    FetchThenTranscode {
        fetch: Vec<Descriptor>,
        scratch: PathBuf,
        transcode: Vec<Descriptor>,
    },
}

impl Plan {
    pub fn len(&self) -> usize {
        match self {
            Plan::Flat(descriptors) => descriptors.len(),
            Plan::FetchThenTranscode { fetch, transcode, .. } => fetch.len() + transcode.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether the extractor cannot produce this kind directly for the platform
pub fn requires_transcode(platform: Platform, kind: MediaKind) -> bool {
    matches!((platform, kind), (Platform::Instagram, MediaKind::Audio))
}

/// Knobs shared by every descriptor the catalog builds
#[derive(Debug, Clone)]
pub struct StrategySettings {
    pub extractor_program: String,
    pub transcoder_program: String,
    pub max_filesize_mb: u32,
    pub timeout: Duration,
    pub extended_timeout: Duration,
    pub transcode_timeout: Duration,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            extractor_program: "yt-dlp".to_string(),
            transcoder_program: "ffmpeg".to_string(),
            max_filesize_mb: 100,
            timeout: Duration::from_secs(120),
            extended_timeout: Duration::from_secs(240),
            transcode_timeout: Duration::from_secs(120),
        }
    }
}

impl From<&Config> for StrategySettings {
    fn from(config: &Config) -> Self {
        Self {
            extractor_program: config.extractor.program.clone(),
            transcoder_program: config.transcoder.program.clone(),
            max_filesize_mb: config.extractor.max_filesize_mb,
            timeout: config.extractor.timeout(),
            extended_timeout: config.extractor.extended_timeout(),
            transcode_timeout: config.transcoder.timeout(),
        }
    }
}

/// Inputs every platform ladder is built from
pub struct LadderContext<'a> {
    pub settings: &'a StrategySettings,
    pub agents: &'a dyn UserAgentSource,
    pub quality: Quality,
    pub url: &'a str,
}

/// Produces ordered descriptor lists for (platform, kind, quality)
pub struct Catalog {
    settings: StrategySettings,
    agents: Arc<dyn UserAgentSource>,
}

impl Catalog {
    pub fn new(settings: StrategySettings, agents: Arc<dyn UserAgentSource>) -> Self {
        Self { settings, agents }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(StrategySettings::from(config), Arc::new(RandomUserAgents))
    }

    /// The flat graceful-degradation ladder for a request.
    ///
    /// Never empty; each descriptor's command shape matches `kind`.
    pub fn strategies_for(
        &self,
        platform: Platform,
        kind: MediaKind,
        quality: &str,
        url: &str,
        output: &Path,
    ) -> Vec<Descriptor> {
        let quality = Quality::parse(kind, Some(quality));
        self.ladder(platform, kind, quality, url, output)
    }

    fn ladder(
        &self,
        platform: Platform,
        kind: MediaKind,
        quality: Quality,
        url: &str,
        output: &Path,
    ) -> Vec<Descriptor> {
        let ctx = LadderContext {
            settings: &self.settings,
            agents: self.agents.as_ref(),
            quality,
            url,
        };

        let rungs: Vec<Rung> = match platform {
            Platform::Youtube => youtube::rungs(&ctx),
            Platform::Instagram => instagram::rungs(&ctx),
            Platform::Tiktok => tiktok::rungs(&ctx),
            Platform::Facebook => facebook::rungs(&ctx),
            Platform::Twitter => twitter::rungs(&ctx),
            Platform::Twitch => twitch::rungs(&ctx),
            Platform::Generic => generic::rungs(&ctx),
        };

        let rungs = if rungs.is_empty() { generic::rungs(&ctx) } else { rungs };

        rungs
            .into_iter()
            .map(|rung| rung.into_descriptor(kind, quality, output))
            .collect()
    }

    /// Decide how a request is carried out.
    pub fn plan(
        &self,
        platform: Platform,
        kind: MediaKind,
        quality: &str,
        url: &str,
        output: &Path,
    ) -> Plan {
        let parsed = Quality::parse(kind, Some(quality));

        if !requires_transcode(platform, kind) {
            return Plan::Flat(self.ladder(platform, kind, parsed, url, output));
        }

        let scratch = scratch_path(output);
        let fetch_quality = Quality::Video { max_height: DEFAULT_VIDEO_HEIGHT };
        let fetch = self.ladder(platform, MediaKind::Video, fetch_quality, url, &scratch);
        let transcode = transcode::variants(&self.settings, &scratch, output, parsed.bitrate_kbps());

        Plan::FetchThenTranscode { fetch, scratch, transcode }
    }
}

/// Scratch video path for the fetch stage: `name.mp3` -> `name.source.mp4`
pub fn scratch_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    output.with_file_name(format!("{}.source.{}", stem, MediaKind::Video.extension()))
}
