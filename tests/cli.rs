use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn multigrab(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("multigrab").unwrap();
    cmd.env_remove("MULTIGRAB_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

#[test]
fn test_platforms_lists_every_supported_site() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");

    multigrab(&config)
        .arg("platforms")
        .assert()
        .success()
        .stdout(predicate::str::contains("YouTube (youtube.com, youtu.be)"))
        .stdout(predicate::str::contains("Twitter/X (twitter.com, x.com)"))
        .stdout(predicate::str::contains("TikTok"))
        .stdout(predicate::str::contains("Twitch"))
        .stdout(predicate::str::contains("generic fallback"));

    // First run writes the default configuration
    assert!(config.exists());
}

#[test]
fn test_strategies_shows_tiktok_ladder_in_order() {
    let dir = tempfile::tempdir().unwrap();

    let assert = multigrab(&dir.path().join("config.yaml"))
        .args(["strategies", "https://www.tiktok.com/@user/video/7234", "--quality", "720p"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-filesize 100M"))
        .stdout(predicate::str::contains("https://www.tiktok.com/@user/video/7234"));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let mobile = stdout.find("TikTok Mobile").unwrap();
    let desktop = stdout.find("TikTok Desktop").unwrap();
    let watermark = stdout.find("TikTok Watermark Free").unwrap();
    assert!(mobile < desktop && desktop < watermark);
}

#[test]
fn test_strategies_instagram_audio_is_two_stage() {
    let dir = tempfile::tempdir().unwrap();

    multigrab(&dir.path().join("config.yaml"))
        .args(["strategies", "https://www.instagram.com/reel/Cabc123/", "--kind", "audio"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stage 1: fetch video"))
        .stdout(predicate::str::contains("Stage 2: transcode"))
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("libmp3lame"))
        .stdout(predicate::str::contains("320k"));
}

#[test]
fn test_strategies_youtube_audio_extracts_mp3() {
    let dir = tempfile::tempdir().unwrap();

    multigrab(&dir.path().join("config.yaml"))
        .args(["strategies", "https://youtu.be/dQw4w9WgXcQ", "--kind", "audio", "--quality", "128kbps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--audio-format mp3"))
        .stdout(predicate::str::contains("Stage").not());
}

#[test]
fn test_config_respects_custom_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "extractor:\n  max_filesize_mb: 42\n").unwrap();

    multigrab(&config)
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Max File Size: 42 MB"));

    multigrab(&config)
        .args(["strategies", "https://twitter.com/user/status/1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-filesize 42M"));
}

#[test]
fn test_strategies_write_into_configured_downloads_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    let downloads = dir.path().join("media");
    std::fs::write(&config, format!("app:\n  downloads_dir: {}\n", downloads.display())).unwrap();

    multigrab(&config)
        .args(["strategies", "https://www.tiktok.com/@user/video/7234"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("-o {}", downloads.join("tiktok_").display())));
}

#[test]
fn test_invalid_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "extractor:\n  timeout_secs: 0\n").unwrap();

    multigrab(&config).arg("platforms").assert().failure();
}

#[test]
fn test_download_rejects_non_http_url() {
    let dir = tempfile::tempdir().unwrap();

    multigrab(&dir.path().join("config.yaml"))
        .args(["download", "ftp://example.com/file.mp4", "--no-metadata"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP"));
}

#[test]
fn test_missing_subcommand_shows_usage() {
    Command::cargo_bin("multigrab")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
