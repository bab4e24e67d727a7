use super::agents::AgentProfile;
use super::ytdlp::{capped, Rung, YtDlpCommand};
use super::LadderContext;

const APP_AGENT: &str = "Instagram 302.0.0.27.103 Android";
const APP_ID: &str = "936619743392459";

pub(crate) fn rungs(ctx: &LadderContext<'_>) -> Vec<Rung> {
    let height = ctx.quality.max_height();
    let base = || YtDlpCommand::new(ctx.settings);

    vec![
        Rung::new(
            "Instagram Mobile App Simulation",
            base().user_agent(APP_AGENT).header("X-IG-App-ID", APP_ID),
            ctx.url,
        )
        .video_format(capped(height, "mp4")),
        Rung::new(
            "Instagram Browser Cookies",
            base()
                .option("--cookies-from-browser", "firefox")
                .user_agent(ctx.agents.pick(AgentProfile::Mobile))
                .option("--extractor-retries", 5),
            ctx.url,
        )
        .video_format(capped(height, "mp4")),
        Rung::new(
            "Instagram Chrome Referer Bypass",
            base()
                .user_agent(ctx.agents.pick(AgentProfile::Desktop))
                .header("Sec-Fetch-Site", "same-origin")
                .referer("https://www.instagram.com/"),
            ctx.url,
        )
        .video_format("worst")
        .audio_cap(128),
    ]
}
