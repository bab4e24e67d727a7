use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use multigrab::cli::{self, Cli, Commands};
use multigrab::delivery::{self, Destination};
use multigrab::metadata::MetadataFetcher;
use multigrab::platform::{self, Platform};
use multigrab::strategies::{Descriptor, MediaKind, Plan};
use multigrab::{utils, Config, Downloader};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "multigrab=debug" } else { "multigrab=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config.as_deref()).await?;

    if matches!(cli.command, Commands::Download { .. } | Commands::Info { .. }) {
        let missing_deps = utils::check_dependencies(&config.extractor.program, &config.transcoder.program).await;
        if !missing_deps.is_empty() {
            eprintln!("⚠️  Dependency check warnings:");
            for dep in missing_deps {
                eprintln!("   • {}", dep);
            }
            eprintln!("   (Continuing anyway - tools may be available)");
        }
    }

    match cli.command {
        Commands::Download {
            url,
            kind,
            quality,
            output,
            json,
            no_metadata,
        } => {
            let quality = quality.unwrap_or_else(|| cli::default_quality(kind).to_string());
            run_download(&config, &url, kind, &quality, output.as_deref(), json, no_metadata, cli.quiet).await?;
        }
        Commands::Info { url, json } => {
            platform::validate_url(&url)?;

            let fetcher = MetadataFetcher::from_config(&config);
            let progress = spinner(cli.quiet || json, "Looking up media information...");
            let metadata = fetcher.fetch(&url).await;
            progress.finish_and_clear();

            let Some(metadata) = metadata else {
                anyhow::bail!("Could not retrieve information for {}", url);
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&metadata)?);
            } else {
                println!("{}", style(&metadata.title).bold());
                println!("  Platform: {}", metadata.platform);
                println!("  Uploader: {}", metadata.uploader);
                if let Some(duration) = &metadata.duration_label {
                    println!("  Duration: {}", duration);
                }
                if let Some(views) = metadata.view_count {
                    println!("  Views: {}", views);
                }
                if let Some(date) = &metadata.upload_date {
                    println!("  Uploaded: {}", date);
                }
                if let Some(thumbnail) = &metadata.thumbnail {
                    println!("  Thumbnail: {}", thumbnail);
                }
            }
        }
        Commands::Strategies { url, kind, quality } => {
            let quality = quality.unwrap_or_else(|| cli::default_quality(kind).to_string());
            print_plan(&config, &url, kind, &quality);
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                let path = match cli.config {
                    Some(path) => path,
                    None => Config::config_path()?,
                };
                println!("Configuration file: {}", path.display());
                println!("Edit it to change tools, timeouts and retry pacing, or run `multigrab config --show`.");
            }
        }
        Commands::Platforms => {
            println!("Supported platforms:");
            for platform in Platform::ALL.iter().filter(|p| **p != Platform::Generic) {
                println!("  • {} ({})", platform.display_name(), platform.hosts().join(", "));
            }
            println!("  • Any other site yt-dlp understands (generic fallback)");
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_download(
    config: &Config,
    url: &str,
    kind: MediaKind,
    quality: &str,
    output: Option<&str>,
    json: bool,
    no_metadata: bool,
    quiet: bool,
) -> Result<()> {
    platform::validate_url(url)?;
    let url = platform::clean_url(url);
    let destination = output.map(Destination::parse);

    // Progress and human output must stay off stdout when it carries the media
    let to_stdout = destination == Some(Destination::Stdout);
    let quiet = quiet || json || to_stdout;

    let title = if no_metadata {
        None
    } else {
        let progress = spinner(quiet, "Looking up title...");
        let metadata = MetadataFetcher::from_config(config).fetch(&url).await;
        progress.finish_and_clear();
        metadata.map(|m| m.title)
    };

    let downloader = Downloader::from_config(config);
    let platform = platform::classify(&url);

    let progress = spinner(quiet, &format!("Downloading {} {}...", platform, kind));
    let started = std::time::Instant::now();
    let mut outcome = downloader.request_download_titled(&url, kind, quality, title.as_deref()).await;

    let (Some(path), true) = (outcome.filepath.clone(), outcome.success) else {
        progress.finish_with_message("Download failed");
        if json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        let message = outcome
            .error
            .as_ref()
            .map(utils::describe_failure)
            .unwrap_or_else(|| "download failed".to_string());
        anyhow::bail!(message);
    };
    progress.finish_with_message(format!(
        "Downloaded in {}",
        utils::format_duration(started.elapsed().as_secs_f64())
    ));

    let final_path = match &destination {
        Some(destination) => delivery::deliver(&path, destination).await?,
        None => Some(path.clone()),
    };

    let Some(final_path) = final_path else {
        // Streamed to stdout. The process is about to exit, so wait out the
        // grace period here or the removal task dies with the runtime.
        let removal = delivery::schedule_removal(path, config.retention());
        removal.await?;
        return Ok(());
    };
    outcome.filepath = Some(final_path.clone());

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_success(&final_path, outcome.strategy.as_deref(), outcome.attempts).await;
    }

    Ok(())
}

async fn print_success(path: &Path, strategy: Option<&str>, attempts: usize) {
    let size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
    println!("{} Saved to {}", style("✓").green().bold(), path.display());
    println!("  Size: {}", utils::format_file_size(size));
    if let Some(strategy) = strategy {
        println!("  Strategy: {} (attempt {})", strategy, attempts);
    }
}

fn print_plan(config: &Config, url: &str, kind: MediaKind, quality: &str) {
    let url = platform::clean_url(url);
    let platform = platform::classify(&url);
    let downloader = Downloader::from_config(config);
    let output = downloader.output_path(None, platform, kind);

    println!("{} {} download ({})", style(platform.display_name()).bold(), kind, quality);

    match downloader.catalog().plan(platform, kind, quality, &url, &output) {
        Plan::Flat(descriptors) => print_descriptors(&descriptors),
        Plan::FetchThenTranscode { fetch, scratch, transcode } => {
            println!("{} fetch video into {}", style("Stage 1:").cyan(), scratch.display());
            print_descriptors(&fetch);
            println!("{} transcode to {}", style("Stage 2:").cyan(), output.display());
            print_descriptors(&transcode);
        }
    }
}

fn print_descriptors(descriptors: &[Descriptor]) {
    for (index, descriptor) in descriptors.iter().enumerate() {
        let mut timing = format!("timeout {}s", descriptor.command.timeout.as_secs());
        if let Some(delay) = descriptor.command.pre_delay {
            timing.push_str(&format!(", waits {}s first", delay.as_secs()));
        }
        println!("  {}. {} {}", index + 1, style(&descriptor.name).green(), style(format!("({})", timing)).dim());
        println!("     {}", descriptor.command);
    }
}

fn spinner(hidden: bool, message: &str) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message(message.to_string());
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}
