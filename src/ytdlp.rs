use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, WrapErr, bail};
use log::debug;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;

use crate::subtitle::CaptionFormat;
use crate::transcript::MediaExtractor;
use crate::{UNKNOWN_TITLE, VideoMetadata, thumbnail_url, watch_url};

/// Subset of yt-dlp's `--dump-single-json` output we care about
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaInfo {
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub subtitles: Option<BTreeMap<String, Vec<SubtitleFormat>>>,
    pub automatic_captions: Option<BTreeMap<String, Vec<SubtitleFormat>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubtitleFormat {
    pub ext: Option<String>,
    pub url: Option<String>,
}

/// A concrete caption file we can download
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleTrack {
    pub language: String,
    pub automatic: bool,
    pub format: CaptionFormat,
    pub url: String,
}

impl MediaInfo {
    /// Manual English, then automatic English; best format within the track
    pub fn preferred_track(&self) -> Option<SubtitleTrack> {
        pick_english(self.subtitles.as_ref(), false).or_else(|| pick_english(self.automatic_captions.as_ref(), true))
    }

    /// Broadest choice: manual before automatic, `en`, `en-US`, then whatever language comes first
    pub fn fallback_track(&self) -> Option<SubtitleTrack> {
        pick_any(self.subtitles.as_ref(), false).or_else(|| pick_any(self.automatic_captions.as_ref(), true))
    }

    pub fn metadata(&self, video_id: &str) -> VideoMetadata {
        VideoMetadata {
            video_id: video_id.to_string(),
            title: self
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            duration_seconds: self.duration.filter(|d| d.is_finite() && *d > 0.0).map_or(0, |d| d.round() as u64),
            thumbnail_url: self
                .thumbnail
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| thumbnail_url(video_id)),
        }
    }
}

fn pick_english(tracks: Option<&BTreeMap<String, Vec<SubtitleFormat>>>, automatic: bool) -> Option<SubtitleTrack> {
    let tracks = tracks?;
    let exact = ["en", "en-orig"]
        .iter()
        .find_map(|lang| tracks.get_key_value(*lang));
    let variant = || tracks.iter().find(|(lang, _)| lang.starts_with("en-"));

    exact
        .or_else(variant)
        .and_then(|(lang, formats)| pick_format(lang, formats, automatic))
}

fn pick_any(tracks: Option<&BTreeMap<String, Vec<SubtitleFormat>>>, automatic: bool) -> Option<SubtitleTrack> {
    let tracks = tracks?;
    ["en", "en-US"]
        .iter()
        .find_map(|lang| tracks.get_key_value(*lang))
        .and_then(|(lang, formats)| pick_format(lang, formats, automatic))
        .or_else(|| {
            tracks
                .iter()
                .find_map(|(lang, formats)| pick_format(lang, formats, automatic))
        })
}

/// `vtt` first, then `json3`, then anything with a URL
fn pick_format(language: &str, formats: &[SubtitleFormat], automatic: bool) -> Option<SubtitleTrack> {
    let with_ext = |wanted: &str| {
        formats
            .iter()
            .find(|f| f.url.is_some() && f.ext.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(wanted)))
    };

    let chosen = with_ext("vtt")
        .or_else(|| with_ext("json3"))
        .or_else(|| formats.iter().find(|f| f.url.is_some()))?;

    Some(SubtitleTrack {
        language: language.to_string(),
        automatic,
        format: CaptionFormat::from_ext(chosen.ext.as_deref().unwrap_or("vtt")),
        url: chosen.url.clone()?,
    })
}

/// Runs the `yt-dlp` binary to read video metadata and subtitle URLs
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
    timeout: Duration,
}

impl YtDlp {
    /// The child is killed when `timeout` elapses
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaExtractor for YtDlp {
    async fn extract_info(&self, video_id: &str) -> Result<MediaInfo> {
        let url = watch_url(video_id);
        debug!("Extracting media info via {}: {url}", self.binary);

        let run = Command::new(&self.binary)
            .args([
                "--dump-single-json",
                "--skip-download",
                "--no-warnings",
                "--no-playlist",
                &url,
            ])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match timeout(self.timeout, run).await {
            Err(_) => bail!("{} timed out after {}s", self.binary, self.timeout.as_secs_f64()),
            Ok(Ok(o)) => o,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                bail!("{} not found. Install it to enable the extractor fallback: pip install yt-dlp", self.binary);
            }
            Ok(Err(e)) => bail!("failed to run {}: {e}", self.binary),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            bail!("{} exited with status {}: {last_line}", self.binary, output.status);
        }

        parse_info(&output.stdout)
    }
}

fn parse_info(stdout: &[u8]) -> Result<MediaInfo> {
    serde_json::from_slice(stdout).wrap_err("could not parse yt-dlp JSON output")
}
