pub mod extractor;
pub mod job;
pub mod yt_dlp;

use std::fmt;

use chrono::Utc;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::store::{ARTIFACT_PREFIX, sanitize_filename};

/// Url prefix under which artifacts are served
pub const MOUNT_PREFIX: &str = "/downloads";

/// Same set `encodeURIComponent` leaves alone
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Coarse classification of a source url, only used for naming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    TikTok,
    Youtube,
    Other,
}

/// Known platforms, checked in declaration order
const PLATFORM_DOMAINS: &[(Platform, &[&str])] = &[
    (Platform::TikTok, &["tiktok.com"]),
    (Platform::Youtube, &["youtube.com", "youtu.be"]),
];

impl Platform {
    /// The first platform with a domain contained in `url` wins
    pub fn from_url(url: &str) -> Self {
        let url = url.to_ascii_lowercase();
        PLATFORM_DOMAINS
            .iter()
            .find(|(_, domains)| domains.iter().any(|domain| url.contains(domain)))
            .map(|(platform, _)| *platform)
            .unwrap_or(Platform::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::Youtube => "youtube",
            Platform::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds `kintaro_{platform}_{unix millis}.mp4` for a new job
pub fn artifact_name(platform: Platform, timestamp_millis: i64) -> String {
    sanitize_filename(&format!(
        "{}{}_{}.mp4",
        ARTIFACT_PREFIX, platform, timestamp_millis
    ))
}

/// Artifact name for a job started now
pub fn artifact_name_now(platform: Platform) -> String {
    artifact_name(platform, Utc::now().timestamp_millis())
}

/// Url the artifact `name` is served at
pub fn access_url(name: &str) -> String {
    format!("{}/{}", MOUNT_PREFIX, utf8_percent_encode(name, COMPONENT))
}
