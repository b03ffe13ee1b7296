use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use eyre::{Result, eyre};
use summtube::transcript::{CaptionSource, MediaExtractor, SubtitleFetcher};
use summtube::ytdlp::{MediaInfo, SubtitleFormat};

/// Caption api that returns a fixed transcript or a fixed error
#[derive(Clone)]
pub struct MockCaptions {
    pub result: std::result::Result<String, String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockCaptions {
    pub fn ok(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            result: Err(msg.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl CaptionSource for MockCaptions {
    async fn fetch_transcript(&self, video_id: &str) -> Result<String> {
        self.calls.lock().unwrap().push(video_id.to_string());
        self.result.clone().map_err(|e| eyre!(e))
    }
}

/// Extractor returning canned media info
#[derive(Clone)]
pub struct MockExtractor {
    pub result: std::result::Result<MediaInfo, String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockExtractor {
    pub fn ok(info: MediaInfo) -> Self {
        Self {
            result: Ok(info),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            result: Err(msg.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl MediaExtractor for MockExtractor {
    async fn extract_info(&self, video_id: &str) -> Result<MediaInfo> {
        self.calls.lock().unwrap().push(video_id.to_string());
        self.result.clone().map_err(|e| eyre!(e))
    }
}

/// Fetcher that answers per URL; unknown URLs fail
#[derive(Clone, Default)]
pub struct MockFetcher {
    pub payloads: BTreeMap<String, String>,
    pub error: Option<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn with(url: &str, payload: &str) -> Self {
        let mut fetcher = Self::default();
        fetcher.payloads.insert(url.to_string(), payload.to_string());
        fetcher
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            error: Some(msg.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SubtitleFetcher for MockFetcher {
    async fn download(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(ref msg) = self.error {
            return Err(eyre!("{msg}"));
        }
        self.payloads
            .get(url)
            .cloned()
            .ok_or_else(|| eyre!("caption download returned HTTP Error 404"))
    }
}

pub fn track(ext: &str, url: &str) -> SubtitleFormat {
    SubtitleFormat {
        ext: Some(ext.to_string()),
        url: Some(url.to_string()),
    }
}

/// Media info with one manual English vtt track and a German fallback
pub fn sample_info() -> MediaInfo {
    let mut subtitles = BTreeMap::new();
    subtitles.insert("en".to_string(), vec![track("vtt", "https://captions.test/en.vtt")]);
    MediaInfo {
        title: Some("Sample Video".to_string()),
        duration: Some(125.0),
        thumbnail: Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg".to_string()),
        subtitles: Some(subtitles),
        automatic_captions: None,
    }
}

/// Media info whose only track is a non-English automatic one
pub fn foreign_only_info() -> MediaInfo {
    let mut automatic = BTreeMap::new();
    automatic.insert("de".to_string(), vec![track("vtt", "https://captions.test/de.vtt")]);
    MediaInfo {
        title: Some("Fremdes Video".to_string()),
        duration: Some(60.0),
        thumbnail: None,
        subtitles: None,
        automatic_captions: Some(automatic),
    }
}

pub const SAMPLE_VTT: &str = "WEBVTT
Kind: captions
Language: en

00:00:00.000 --> 00:00:01.000
hello <c>from</c>

00:00:01.000 --> 00:00:02.000
the extractor
";
