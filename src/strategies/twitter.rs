use super::agents::AgentProfile;
use super::ytdlp::{capped, Rung, YtDlpCommand};
use super::LadderContext;

pub(crate) fn rungs(ctx: &LadderContext<'_>) -> Vec<Rung> {
    let height = ctx.quality.max_height();

    vec![
        Rung::new(
            "Twitter Standard",
            YtDlpCommand::new(ctx.settings).user_agent(ctx.agents.pick(AgentProfile::Desktop)),
            ctx.url,
        )
        .video_format(capped(height, "best")),
        Rung::new(
            "Twitter Mobile",
            YtDlpCommand::new(ctx.settings)
                .user_agent(ctx.agents.pick(AgentProfile::Mobile))
                .option("--extractor-retries", 3),
            ctx.url,
        )
        .video_format("worst")
        .audio_cap(128),
    ]
}
