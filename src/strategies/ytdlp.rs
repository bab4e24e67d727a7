use std::path::Path;
use std::time::Duration;

use super::{CommandSpec, Descriptor, MediaKind, Quality, StrategySettings};

/// Builder for one yt-dlp invocation, pre-loaded with the options every
/// strategy shares.
#[derive(Debug, Clone)]
pub(crate) struct YtDlpCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    pre_delay: Option<Duration>,
}

impl YtDlpCommand {
    pub fn new(settings: &StrategySettings) -> Self {
        let args = vec![
            "--no-check-certificate".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--max-filesize".to_string(),
            format!("{}M", settings.max_filesize_mb),
        ];

        Self {
            program: settings.extractor_program.clone(),
            args,
            timeout: settings.timeout,
            pre_delay: None,
        }
    }

    pub fn flag(mut self, flag: &str) -> Self {
        self.args.push(flag.to_string());
        self
    }

    pub fn option(mut self, name: &str, value: impl ToString) -> Self {
        self.args.push(name.to_string());
        self.args.push(value.to_string());
        self
    }

    pub fn user_agent(self, agent: impl ToString) -> Self {
        self.option("--user-agent", agent)
    }

    pub fn referer(self, referer: &str) -> Self {
        self.option("--referer", referer)
    }

    pub fn header(self, name: &str, value: &str) -> Self {
        self.option("--add-header", format!("{}:{}", name, value))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn pre_delay(mut self, delay: Duration) -> Self {
        self.pre_delay = Some(delay);
        self
    }
}

/// One step of a platform's degradation ladder, still independent of media kind
#[derive(Debug, Clone)]
pub(crate) struct Rung {
    name: &'static str,
    command: YtDlpCommand,
    url: String,
    video_format: String,
    audio_cap_kbps: Option<u32>,
}

impl Rung {
    pub fn new(name: &'static str, command: YtDlpCommand, url: &str) -> Self {
        Self {
            name,
            command,
            url: url.to_string(),
            video_format: "best".to_string(),
            audio_cap_kbps: None,
        }
    }

    pub fn video_format(mut self, format: impl Into<String>) -> Self {
        self.video_format = format.into();
        self
    }

    /// Lower bound on degradation: this rung never asks for more than `kbps`
    pub fn audio_cap(mut self, kbps: u32) -> Self {
        self.audio_cap_kbps = Some(kbps);
        self
    }

    pub fn into_descriptor(self, kind: MediaKind, quality: Quality, output: &Path) -> Descriptor {
        let YtDlpCommand { program, mut args, timeout, pre_delay } = self.command;

        match kind {
            MediaKind::Video => {
                args.extend([
                    "-f".to_string(),
                    self.video_format,
                    "-o".to_string(),
                    literal_template(&output.to_string_lossy()),
                ]);
            }
            MediaKind::Audio => {
                let bitrate = quality
                    .bitrate_kbps()
                    .min(self.audio_cap_kbps.unwrap_or(u32::MAX));
                // yt-dlp picks the intermediate extension; post-processing lands on .mp3
                let stem = output.with_extension("");
                let template = format!("{}.%(ext)s", literal_template(&stem.to_string_lossy()));
                args.extend([
                    "-x".to_string(),
                    "--audio-format".to_string(),
                    "mp3".to_string(),
                    "--audio-quality".to_string(),
                    format!("{}K", bitrate),
                    "-o".to_string(),
                    template,
                ]);
            }
        }
        args.push(self.url);

        Descriptor {
            name: self.name.to_string(),
            kind,
            output: output.to_path_buf(),
            command: CommandSpec { program, args, timeout, pre_delay },
        }
    }
}

/// `-o` takes an output template; a literal `%` must be doubled
fn literal_template(path: &str) -> String {
    path.replace('%', "%%")
}

/// `best[height<=H]` style selector with a fallback chain
pub(crate) fn capped(height: u32, fallback: &str) -> String {
    format!("best[height<={h}][ext=mp4]/best[height<={h}]/{fallback}", h = height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_base_options_come_first() {
        let command = YtDlpCommand::new(&StrategySettings::default()).user_agent("UA");
        assert_eq!(
            command.args,
            vec!["--no-check-certificate", "--no-playlist", "--no-warnings", "--max-filesize", "100M", "--user-agent", "UA"]
        );
    }

    #[test]
    fn test_audio_cap_limits_requested_bitrate() {
        let rung = Rung::new("Test", YtDlpCommand::new(&StrategySettings::default()), "https://example.com/1").audio_cap(96);
        let descriptor = rung.into_descriptor(
            MediaKind::Audio,
            Quality::Audio { bitrate_kbps: 320 },
            &PathBuf::from("/d/a.mp3"),
        );
        let args = &descriptor.command.args;
        let q = args.iter().position(|a| a == "--audio-quality").unwrap();
        assert_eq!(args[q + 1], "96K");
    }

    #[test]
    fn test_header_is_name_colon_value() {
        let command = YtDlpCommand::new(&StrategySettings::default()).header("X-IG-App-ID", "936619743392459");
        assert!(command.args.ends_with(&["--add-header".to_string(), "X-IG-App-ID:936619743392459".to_string()]));
    }

    #[test]
    fn test_percent_in_output_path_is_escaped() {
        let output = PathBuf::from("/media/100%/clip.mp4");
        let rung = || Rung::new("Test", YtDlpCommand::new(&StrategySettings::default()), "https://example.com/1");

        let video = rung().into_descriptor(MediaKind::Video, Quality::Video { max_height: 720 }, &output);
        let o = video.command.args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(video.command.args[o + 1], "/media/100%%/clip.mp4");
        assert_eq!(video.output, output);

        let audio = rung().into_descriptor(
            MediaKind::Audio,
            Quality::Audio { bitrate_kbps: 192 },
            &PathBuf::from("/media/100%/clip.mp3"),
        );
        let o = audio.command.args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(audio.command.args[o + 1], "/media/100%%/clip.%(ext)s");
    }

    #[test]
    fn test_capped_selector() {
        assert_eq!(capped(480, "worst"), "best[height<=480][ext=mp4]/best[height<=480]/worst");
    }
}
