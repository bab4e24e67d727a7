use serde::{Deserialize, Serialize};
use url::Url;

use crate::Result;

/// Source service a URL belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Instagram,
    Tiktok,
    Facebook,
    Twitter,
    Twitch,
    Generic,
}

/// Ordered classification table; the first matching row wins.
const PLATFORM_HOSTS: &[(Platform, &[&str])] = &[
    (Platform::Youtube, &["youtube.com", "youtu.be"]),
    (Platform::Instagram, &["instagram.com"]),
    (Platform::Tiktok, &["tiktok.com"]),
    (Platform::Facebook, &["facebook.com", "fb.watch"]),
    (Platform::Twitter, &["twitter.com", "x.com"]),
    (Platform::Twitch, &["twitch.tv"]),
];

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::Youtube,
        Platform::Instagram,
        Platform::Tiktok,
        Platform::Facebook,
        Platform::Twitter,
        Platform::Twitch,
        Platform::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
            Platform::Twitch => "twitch",
            Platform::Generic => "generic",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Youtube => "YouTube",
            Platform::Instagram => "Instagram",
            Platform::Tiktok => "TikTok",
            Platform::Facebook => "Facebook",
            Platform::Twitter => "Twitter/X",
            Platform::Twitch => "Twitch",
            Platform::Generic => "Generic",
        }
    }

    /// Host patterns recognised for this platform (empty for `Generic`)
    pub fn hosts(&self) -> &'static [&'static str] {
        PLATFORM_HOSTS
            .iter()
            .find(|(platform, _)| platform == self)
            .map(|(_, hosts)| *hosts)
            .unwrap_or(&[])
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Map a URL to its platform.
///
/// Parsed URLs are matched on the host (exact or subdomain). Anything that
/// does not parse falls back to substring matching so pasted fragments like
/// `youtu.be/abc` still classify.
pub fn classify(url: &str) -> Platform {
    let lowered = url.trim().to_lowercase();

    if let Some(host) = Url::parse(&lowered)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_string()))
    {
        return PLATFORM_HOSTS
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| host_matches(&host, p)))
            .map(|(platform, _)| *platform)
            .unwrap_or(Platform::Generic);
    }

    PLATFORM_HOSTS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| lowered.contains(p)))
        .map(|(platform, _)| *platform)
        .unwrap_or(Platform::Generic)
}

fn host_matches(host: &str, pattern: &str) -> bool {
    host == pattern
        || host
            .strip_suffix(pattern)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Query parameters that turn a single YouTube video into a playlist or offset
const YOUTUBE_NOISE_PARAMS: &[&str] = &["list", "index", "t", "start_radio", "pp"];

/// Strip invisible characters and playlist noise from a URL.
pub fn clean_url(url: &str) -> String {
    let stripped: String = url
        .chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}'))
        .collect();
    let stripped = stripped.trim().to_string();

    if classify(&stripped) != Platform::Youtube {
        return stripped;
    }

    let Ok(mut parsed) = Url::parse(&stripped) else {
        return stripped;
    };

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !YOUTUBE_NOISE_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }

    parsed.to_string()
}

/// Extract the 11-character YouTube video id, if present.
pub fn youtube_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();

    let candidate = if host_matches(&host, "youtu.be") {
        parsed.path_segments()?.next().map(|s| s.to_string())
    } else if host_matches(&host, "youtube.com") {
        let mut segments = parsed.path_segments()?;
        match segments.next() {
            Some("watch") => parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed") | Some("shorts") | Some("v") | Some("live") => {
                segments.next().map(|s| s.to_string())
            }
            _ => None,
        }
    } else {
        None
    }?;

    let valid = candidate.len() == 11
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    valid.then_some(candidate)
}

/// Validate that a URL uses HTTP or HTTPS
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_platforms() {
        assert_eq!(classify("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), Platform::Youtube);
        assert_eq!(classify("https://youtu.be/dQw4w9WgXcQ"), Platform::Youtube);
        assert_eq!(classify("https://m.youtube.com/watch?v=dQw4w9WgXcQ"), Platform::Youtube);
        assert_eq!(classify("https://www.instagram.com/reel/Cabc123/"), Platform::Instagram);
        assert_eq!(classify("https://www.tiktok.com/@user/video/123"), Platform::Tiktok);
        assert_eq!(classify("https://vm.tiktok.com/ZMabc/"), Platform::Tiktok);
        assert_eq!(classify("https://fb.watch/abc/"), Platform::Facebook);
        assert_eq!(classify("https://www.facebook.com/watch/?v=1"), Platform::Facebook);
        assert_eq!(classify("https://x.com/user/status/1"), Platform::Twitter);
        assert_eq!(classify("https://mobile.twitter.com/user/status/1"), Platform::Twitter);
        assert_eq!(classify("https://www.twitch.tv/videos/1"), Platform::Twitch);
    }

    #[test]
    fn test_classify_ignores_query_suffixes() {
        assert_eq!(
            classify("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123&index=4"),
            Platform::Youtube
        );
        assert_eq!(
            classify("https://www.instagram.com/p/abc/?utm_source=ig_web_copy_link&igsh=xyz"),
            Platform::Instagram
        );
        assert_eq!(
            classify("https://www.tiktok.com/@user/video/123?is_from_webapp=1&sender_device=pc"),
            Platform::Tiktok
        );
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("HTTPS://WWW.YOUTUBE.COM/watch?v=dQw4w9WgXcQ"), Platform::Youtube);
        assert_eq!(classify("https://Twitch.TV/someone"), Platform::Twitch);
    }

    #[test]
    fn test_classify_lookalike_hosts_are_generic() {
        assert_eq!(classify("https://netflix.com/title/1"), Platform::Generic);
        assert_eq!(classify("https://notyoutube.com/watch?v=1"), Platform::Generic);
        assert_eq!(classify("https://vimeo.com/123"), Platform::Generic);
    }

    #[test]
    fn test_classify_query_mentioning_other_platform() {
        assert_eq!(
            classify("https://www.tiktok.com/@user/video/1?ref=youtube.com"),
            Platform::Tiktok
        );
    }

    #[test]
    fn test_classify_unparseable_falls_back_to_substring() {
        assert_eq!(classify("youtu.be/dQw4w9WgXcQ"), Platform::Youtube);
        assert_eq!(classify("not a url at all"), Platform::Generic);
    }

    #[test]
    fn test_clean_url_strips_playlist_params() {
        let cleaned = clean_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123&index=4&t=30s");
        assert_eq!(cleaned, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_clean_url_strips_zero_width_characters() {
        let cleaned = clean_url("\u{200B} https://www.tiktok.com/@user/video/1\u{FEFF} ");
        assert_eq!(cleaned, "https://www.tiktok.com/@user/video/1");
    }

    #[test]
    fn test_clean_url_leaves_other_platforms_alone() {
        let url = "https://www.instagram.com/p/abc/?igsh=xyz";
        assert_eq!(clean_url(url), url);
    }

    #[test]
    fn test_youtube_video_id() {
        assert_eq!(youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL1"), Some("dQw4w9WgXcQ".to_string()));
        assert_eq!(youtube_video_id("https://youtu.be/dQw4w9WgXcQ?t=1"), Some("dQw4w9WgXcQ".to_string()));
        assert_eq!(youtube_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
        assert_eq!(youtube_video_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(youtube_video_id("https://vimeo.com/dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/video").is_ok());
        assert!(validate_url("ftp://example.com/video").is_err());
        assert!(validate_url("not-a-url").is_err());
    }
}
