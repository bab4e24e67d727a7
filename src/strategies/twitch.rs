use super::agents::AgentProfile;
use super::ytdlp::{capped, Rung, YtDlpCommand};
use super::LadderContext;

pub(crate) fn rungs(ctx: &LadderContext<'_>) -> Vec<Rung> {
    vec![Rung::new(
        "Twitch Standard",
        YtDlpCommand::new(ctx.settings)
            .timeout(ctx.settings.extended_timeout)
            .user_agent(ctx.agents.pick(AgentProfile::Desktop)),
        ctx.url,
    )
    .video_format(capped(ctx.quality.max_height(), "best"))]
}
