use std::path::Path;

use super::{CommandSpec, Descriptor, MediaKind, StrategySettings};

/// Ordered ffmpeg variants that turn the fetched video into the final MP3.
///
/// Constant bitrate at the requested rate first, then LAME VBR, then whatever
/// encoder ffmpeg picks by itself for the `.mp3` container.
pub fn variants(settings: &StrategySettings, input: &Path, output: &Path, bitrate_kbps: u32) -> Vec<Descriptor> {
    let input = input.to_string_lossy().into_owned();
    let output_arg = output.to_string_lossy().into_owned();
    let size_cap = format!("{}M", settings.max_filesize_mb);

    let variant = |name: &str, codec_args: &[&str]| {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(input.clone());
        args.push("-vn".to_string());
        args.extend(codec_args.iter().map(|s| s.to_string()));
        args.push("-fs".to_string());
        args.push(size_cap.clone());
        args.push(output_arg.clone());

        Descriptor {
            name: name.to_string(),
            kind: MediaKind::Audio,
            output: output.to_path_buf(),
            command: CommandSpec {
                program: settings.transcoder_program.clone(),
                args,
                timeout: settings.transcode_timeout,
                pre_delay: None,
            },
        }
    };

    let bitrate = format!("{}k", bitrate_kbps);
    vec![
        variant("FFmpeg LAME CBR", &["-acodec", "libmp3lame", "-b:a", bitrate.as_str(), "-ar", "44100"]),
        variant("FFmpeg LAME VBR", &["-acodec", "libmp3lame", "-q:a", "2"]),
        variant("FFmpeg Default Encoder", &[]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_variants_read_scratch_and_write_output() {
        let input = PathBuf::from("/d/clip.source.mp4");
        let output = PathBuf::from("/d/clip.mp3");
        let variants = variants(&StrategySettings::default(), &input, &output, 192);

        assert_eq!(variants.len(), 3);
        for descriptor in &variants {
            let args = &descriptor.command.args;
            let i = args.iter().position(|a| a == "-i").unwrap();
            assert_eq!(args[i + 1], "/d/clip.source.mp4");
            assert_eq!(args.last().unwrap(), "/d/clip.mp3");
            assert!(args.contains(&"-y".to_string()));
            assert!(descriptor.extracts_audio());
            let fs = args.iter().position(|a| a == "-fs").unwrap();
            assert_eq!(args[fs + 1], "100M");
            assert_eq!(fs + 2, args.len() - 1);
        }
        assert!(variants[0].command.args.contains(&"192k".to_string()));
    }
}
