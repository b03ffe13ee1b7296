pub mod config;
pub mod error;
pub mod prompt;
pub mod server;
pub mod service;
pub mod subtitle;
pub mod summarize;
pub mod transcript;
pub mod youtube;
pub mod ytdlp;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder title when the extractor cannot tell us the real one
pub const UNKNOWN_TITLE: &str = "Unknown";

/// How the `source` field of a summarize request should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Text,
    Url,
    Video,
}

impl SourceKind {
    /// Parse a wire value. `youtube` and `video` both name a video link.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(SourceKind::Text),
            "url" => Some(SourceKind::Url),
            "youtube" | "video" => Some(SourceKind::Video),
            _ => None,
        }
    }
}

/// Requested summary format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SummaryStyle {
    #[default]
    Detailed,
    Brief,
    BulletPoints,
}

impl SummaryStyle {
    /// Resolve a style name; anything unrecognized means `Detailed`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "brief" => SummaryStyle::Brief,
            "bullet_points" | "bullet-points" | "bullets" => SummaryStyle::BulletPoints,
            _ => SummaryStyle::Detailed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStyle::Detailed => "detailed",
            SummaryStyle::Brief => "brief",
            SummaryStyle::BulletPoints => "bullet_points",
        }
    }
}

impl From<String> for SummaryStyle {
    fn from(value: String) -> Self {
        SummaryStyle::from_name(&value)
    }
}

impl From<SummaryStyle> for String {
    fn from(value: SummaryStyle) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for SummaryStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort metadata about a video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub duration_seconds: u64,
    pub thumbnail_url: String,
}

impl VideoMetadata {
    /// Metadata used when nothing better could be fetched
    pub fn placeholder(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: UNKNOWN_TITLE.to_string(),
            duration_seconds: 0,
            thumbnail_url: thumbnail_url(video_id),
        }
    }
}

/// Which acquisition strategy produced a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TranscriptSource {
    CaptionApi,
    Extractor,
    DirectDownload,
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSource::CaptionApi => write!(f, "caption-api"),
            TranscriptSource::Extractor => write!(f, "extractor"),
            TranscriptSource::DirectDownload => write!(f, "direct-download"),
        }
    }
}

/// Plain-text transcript for a video
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub text: String,
    pub source: TranscriptSource,
}

/// Output of one summarization
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    pub text: String,
    pub style: SummaryStyle,
    pub processing_time_seconds: f64,
}

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("valid regex"));

// Ordered: first match wins
static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"youtube\.com/watch\?(?:.*&)?v=([a-zA-Z0-9_-]{11})",
        r"youtu\.be/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if BARE_ID.is_match(input) {
        return Some(input.to_string());
    }

    URL_PATTERNS
        .iter()
        .find_map(|re| re.captures(input).map(|caps| caps[1].to_string()))
}

/// Canonical watch URL for a video ID
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Thumbnail URL derived from the video ID alone
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg")
}
