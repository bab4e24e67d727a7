use super::agents::AgentProfile;
use super::ytdlp::{capped, Rung, YtDlpCommand};
use super::LadderContext;

pub(crate) fn rungs(ctx: &LadderContext<'_>) -> Vec<Rung> {
    let height = ctx.quality.max_height();
    let base = || YtDlpCommand::new(ctx.settings);

    vec![
        Rung::new(
            "TikTok Mobile",
            base()
                .user_agent(ctx.agents.pick(AgentProfile::Mobile))
                .option("--extractor-retries", 3),
            ctx.url,
        )
        .video_format(capped(height, "best")),
        Rung::new(
            "TikTok Desktop",
            base()
                .user_agent(ctx.agents.pick(AgentProfile::Desktop))
                .referer("https://www.tiktok.com/"),
            ctx.url,
        )
        .video_format(capped(height.min(480), "worst"))
        .audio_cap(192),
        // "download" is the watermark-free rendition the TikTok extractor exposes
        Rung::new(
            "TikTok Watermark Free",
            base().user_agent(ctx.agents.pick(AgentProfile::Desktop)),
            ctx.url,
        )
        .video_format("download/worst")
        .audio_cap(128),
    ]
}
