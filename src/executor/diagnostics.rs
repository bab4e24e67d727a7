use serde::{Deserialize, Serialize};

/// Best-effort reading of why the extractor gave up.
///
/// Derived from free-text tool output, so it is a hint for humans and for
/// picking the most telling failure, not something to branch behaviour on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// HTTP 403/429 or an explicit block
    Blocked,
    /// Anti-automation check ("confirm you're not a bot", captcha)
    BotDetected,
    /// Private content or login required
    Private,
    /// Geographic restriction
    RegionLocked,
    /// Removed, deleted or otherwise gone
    Unavailable,
    /// The extractor does not understand the URL
    Unsupported,
    /// The external program could not be started
    ToolMissing,
    Unknown,
}

impl FailureCause {
    pub fn description(&self) -> &'static str {
        match self {
            FailureCause::Blocked => "request blocked by the platform",
            FailureCause::BotDetected => "anti-bot check triggered",
            FailureCause::Private => "content is private or requires login",
            FailureCause::RegionLocked => "content is not available in this region",
            FailureCause::Unavailable => "content was removed or is unavailable",
            FailureCause::Unsupported => "URL not supported by the extractor",
            FailureCause::ToolMissing => "external tool could not be started",
            FailureCause::Unknown => "unrecognised extractor error",
        }
    }
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Ordered pattern table; the first row with a matching needle wins.
const PATTERNS: &[(FailureCause, &[&str])] = &[
    (
        FailureCause::BotDetected,
        &["not a bot", "confirm you're not", "captcha", "bot detection", "unusual traffic"],
    ),
    (
        FailureCause::Private,
        &["private video", "this video is private", "login required", "sign in to", "log in to", "requires authentication", "members-only"],
    ),
    (
        FailureCause::RegionLocked,
        &["available in your country", "geo restrict", "geo-restrict", "blocked it in your country"],
    ),
    (
        FailureCause::Blocked,
        &["http error 403", "http error 429", "forbidden", "too many requests", "rate-limit", "rate limit"],
    ),
    (
        FailureCause::Unavailable,
        &["video unavailable", "has been removed", "no longer available", "does not exist", "http error 404", "not found"],
    ),
    (FailureCause::Unsupported, &["unsupported url", "is not a valid url"]),
];

/// Classify extractor error text.
pub fn diagnose(output: &str) -> FailureCause {
    let lower = output.to_lowercase();

    PATTERNS
        .iter()
        .find(|(_, needles)| needles.iter().any(|needle| lower.contains(needle)))
        .map(|(cause, _)| *cause)
        .unwrap_or(FailureCause::Unknown)
}
