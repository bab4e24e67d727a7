use super::agents::AgentProfile;
use super::ytdlp::{capped, Rung, YtDlpCommand};
use super::LadderContext;

/// Single catch-all attempt for URLs no platform row recognised
pub(crate) fn rungs(ctx: &LadderContext<'_>) -> Vec<Rung> {
    vec![Rung::new(
        "Generic Standard",
        YtDlpCommand::new(ctx.settings).user_agent(ctx.agents.pick(AgentProfile::Desktop)),
        ctx.url,
    )
    .video_format(capped(ctx.quality.max_height(), "best"))]
}
