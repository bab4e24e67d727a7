use std::time::Duration;

use super::agents::AgentProfile;
use super::ytdlp::{capped, Rung, YtDlpCommand};
use super::LadderContext;

pub(crate) fn rungs(ctx: &LadderContext<'_>) -> Vec<Rung> {
    let height = ctx.quality.max_height();
    let base = || YtDlpCommand::new(ctx.settings).timeout(ctx.settings.timeout + Duration::from_secs(30));

    vec![
        Rung::new(
            "Facebook Browser Cookies",
            base()
                .option("--cookies-from-browser", "chrome")
                .user_agent(ctx.agents.pick(AgentProfile::Desktop))
                .option("--extractor-retries", 8),
            ctx.url,
        )
        .video_format(capped(height, "mp4")),
        Rung::new(
            "Facebook Mobile Bypass",
            base()
                .user_agent(ctx.agents.pick(AgentProfile::Mobile))
                .header("Accept-Language", "en-US,en;q=0.9")
                .referer("https://www.facebook.com/"),
            ctx.url,
        )
        .video_format("mp4/best")
        .audio_cap(192),
        Rung::new(
            "Facebook Graph Simulation",
            base().user_agent("facebookexternalhit/1.1"),
            ctx.url,
        )
        .video_format("worst")
        .audio_cap(128),
        Rung::new(
            "Facebook Generic Extractor Fallback",
            base()
                .flag("--force-generic-extractor")
                .user_agent(ctx.agents.pick(AgentProfile::Mobile)),
            ctx.url,
        )
        .video_format("worst")
        .audio_cap(96),
    ]
}
