use std::time::Duration;

use super::agents::AgentProfile;
use super::ytdlp::{capped, Rung, YtDlpCommand};
use super::LadderContext;
use crate::platform::{clean_url, youtube_video_id};

const LEGACY_AGENT: &str = "Mozilla/4.0 (compatible; MSIE 9.0; Windows NT 6.1; Trident/5.0)";

/// YouTube ladder: mobile web first, then alternate player clients, then the
/// embed page and legacy progressive formats.
pub(crate) fn rungs(ctx: &LadderContext<'_>) -> Vec<Rung> {
    let url = clean_url(ctx.url);
    let height = ctx.quality.max_height();
    let timeout = ctx.settings.extended_timeout;
    let base = || YtDlpCommand::new(ctx.settings).timeout(timeout).option("--socket-timeout", 30);

    let embed_url = youtube_video_id(&url)
        .map(|id| format!("https://www.youtube.com/embed/{}", id))
        .unwrap_or_else(|| url.clone());

    vec![
        Rung::new(
            "YouTube Simple Mobile",
            base().user_agent(ctx.agents.pick(AgentProfile::Mobile)),
            &url,
        )
        .video_format(capped(height, "18/mp4/worst")),
        Rung::new(
            "YouTube Web Client",
            base()
                .user_agent(ctx.agents.pick(AgentProfile::Desktop))
                .option("--extractor-args", "youtube:player_client=web")
                .option("--sleep-requests", 2),
            &url,
        )
        .video_format(capped(height.min(480), "worst"))
        .audio_cap(192),
        Rung::new(
            "YouTube Embed Bypass",
            base()
                .user_agent(ctx.agents.pick(AgentProfile::Mobile))
                .referer("https://www.youtube.com/")
                .pre_delay(Duration::from_secs(2)),
            &embed_url,
        )
        .video_format("18/worst")
        .audio_cap(128),
        Rung::new(
            "YouTube Android Client",
            base().option("--extractor-args", "youtube:player_client=android"),
            &url,
        )
        .video_format("17/18/36")
        .audio_cap(96),
        Rung::new(
            "YouTube Legacy Format",
            base()
                .flag("--legacy-server-connect")
                .user_agent(LEGACY_AGENT)
                .option("--sleep-requests", 5)
                .pre_delay(Duration::from_secs(3)),
            &url,
        )
        .video_format("17/18/worst")
        .audio_cap(64),
    ]
}
