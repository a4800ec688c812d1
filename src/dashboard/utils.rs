use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::DashboardError;

static VIDEO_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex"));

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "m.youtube.com", "music.youtube.com"];

/// Pulls the video id out of a pasted link or a bare id.
///
/// Accepts `watch?v=<id>`, `youtu.be/<id>`, `/shorts/<id>` and `/embed/<id>`.
pub fn extract_video_id(input: &str) -> Result<String, DashboardError> {
    let trimmed = input.trim();
    if is_video_id(trimmed) {
        return Ok(trimmed.to_string());
    }

    let invalid = || DashboardError::InvalidVideoUrl(trimmed.to_string());
    let url = parse_lenient(trimmed).ok_or_else(invalid)?;
    let host = url
        .host_str()
        .map(|host| host.trim_start_matches("www."))
        .ok_or_else(invalid)?;

    let candidate = if host == "youtu.be" {
        url.path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string)
    } else if YOUTUBE_HOSTS.contains(&host) {
        from_youtube_path(&url)
    } else {
        None
    };

    candidate
        .filter(|id| is_video_id(id))
        .ok_or_else(invalid)
}

fn from_youtube_path(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    match segments.next()? {
        "watch" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        "shorts" | "embed" | "live" => segments.next().map(str::to_string),
        _ => None,
    }
}

/// Links pasted without a scheme still parse.
fn parse_lenient(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|url| url.has_host())
        .or_else(|| Url::parse(&format!("https://{raw}")).ok())
}

fn is_video_id(value: &str) -> bool {
    VIDEO_ID_REGEX.is_match(value)
}
