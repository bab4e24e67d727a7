use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::strategies::MediaKind;

#[derive(Parser)]
#[command(
    name = "multigrab",
    about = "Multigrab - Download video and audio from YouTube, Instagram, TikTok, Facebook, Twitter/X and Twitch",
    version,
    long_about = "A CLI tool that downloads media by driving yt-dlp through ordered, platform-specific fallback strategies. Each attempt is verified on disk and whatever a failed attempt leaves behind is cleaned up before the next one."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE", env = "MULTIGRAB_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a video or its audio track
    Download {
        /// Media page URL
        #[arg(value_name = "URL")]
        url: String,

        /// What to download
        #[arg(short, long, value_enum, default_value = "video")]
        kind: MediaKind,

        /// Quality label, e.g. 1080p/720p/480p/360p for video or 320kbps/192kbps/128kbps for audio
        #[arg(long, value_name = "LABEL")]
        quality: Option<String>,

        /// Move the finished file here (a directory or file path, `-` for stdout)
        #[arg(short, long, value_name = "PATH")]
        output: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,

        /// Skip the metadata lookup used to name the file
        #[arg(long)]
        no_metadata: bool,
    },

    /// Show title, uploader and duration without downloading
    Info {
        /// Media page URL
        #[arg(value_name = "URL")]
        url: String,

        /// Print metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the strategies a download would try, without running them
    Strategies {
        /// Media page URL
        #[arg(value_name = "URL")]
        url: String,

        /// What would be downloaded
        #[arg(short, long, value_enum, default_value = "video")]
        kind: MediaKind,

        /// Quality label
        #[arg(long, value_name = "LABEL")]
        quality: Option<String>,
    },

    /// Show or initialise the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported platforms
    Platforms,
}

/// Quality used when none is given on the command line
pub fn default_quality(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Video => "720p",
        MediaKind::Audio => "320kbps",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_download_arguments() {
        let cli = Cli::parse_from([
            "multigrab", "download", "https://youtu.be/abc", "--kind", "audio", "--quality", "192kbps", "-o", "-",
        ]);
        match cli.command {
            Commands::Download { url, kind, quality, output, json, no_metadata } => {
                assert_eq!(url, "https://youtu.be/abc");
                assert_eq!(kind, MediaKind::Audio);
                assert_eq!(quality.as_deref(), Some("192kbps"));
                assert_eq!(output.as_deref(), Some("-"));
                assert!(!json);
                assert!(!no_metadata);
            }
            _ => panic!("expected download"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["multigrab", "platforms", "--verbose", "--config", "/tmp/c.yaml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yaml")));
    }

    #[test]
    fn test_default_quality() {
        assert_eq!(default_quality(MediaKind::Video), "720p");
        assert_eq!(default_quality(MediaKind::Audio), "320kbps");
    }
}
