use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, bail};
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::transcript::CaptionSource;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const CLIENT_VERSION: &str = "2.20241126.01.00";

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    captions: Option<CaptionsData>,
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    /// `asr` for auto-generated tracks
    kind: Option<String>,
    #[serde(rename = "isTranslatable", default)]
    is_translatable: bool,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn is_english_variant(&self) -> bool {
        self.language_code == "en" || self.language_code.starts_with("en-")
    }
}

/// Which track to download, and whether it has to be machine-translated first
#[derive(Debug, PartialEq)]
enum TrackChoice<'a> {
    Native(&'a CaptionTrack),
    Translated(&'a CaptionTrack),
}

impl TrackChoice<'_> {
    fn url(&self) -> String {
        match self {
            TrackChoice::Native(t) => t.base_url.replace("\\u0026", "&"),
            TrackChoice::Translated(t) => format!("{}&tlang=en", t.base_url.replace("\\u0026", "&")),
        }
    }
}

const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

/// Caption tracks listed by the platform's player endpoint
#[derive(Debug, Clone)]
pub struct InnerTubeCaptions {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl InnerTubeCaptions {
    /// `timeout` bounds each of the three upstream requests
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            client,
            base_url: YOUTUBE_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", "en-US,en;q=0.9")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| e.without_url())?
            .error_for_status()
            .map_err(|e| e.without_url())?;
        Ok(resp.text().await.map_err(|e| e.without_url())?)
    }

    async fn player(&self, api_key: &str, video_id: &str) -> Result<InnerTubePlayerResponse> {
        let player_url = format!("{}/youtubei/v1/player?key={api_key}&prettyPrint=false", self.base_url);

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": "en",
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": CLIENT_VERSION
                }
            },
            "videoId": video_id
        });

        let resp = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.without_url())?
            .error_for_status()
            .map_err(|e| e.without_url())?;
        Ok(resp.json().await.map_err(|e| e.without_url())?)
    }

    /// Fetch an English transcript from the video's built-in caption tracks
    pub async fn fetch_captions(&self, video_id: &str) -> Result<String> {
        let page_url = format!("{}/watch?v={video_id}", self.base_url);
        debug!("Fetching watch page: {page_url}");
        let page_html = self.get_text(&page_url).await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key");

        let resp = self.player(&api_key, video_id).await?;

        if let Some(status) = &resp.playability_status {
            if status.status.as_deref().is_some_and(|s| s != "OK") {
                let reason = status.reason.as_deref().unwrap_or("no reason given");
                debug!("Player reports video {video_id} not playable: {reason}");
                if resp.captions.is_none() {
                    bail!("video {video_id} is not playable: {reason}");
                }
            }
        }

        let tracks = resp
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default();

        if tracks.is_empty() {
            bail!("no captions available for video {video_id}");
        }

        let Some(choice) = select_track(&tracks) else {
            bail!("no English or translatable caption track for video {video_id}");
        };
        debug!("Using caption track: {choice:?}");

        let caption_xml = self.get_text(&choice.url()).await?;
        let text = join_cues(parse_caption_xml(&caption_xml)?);
        if text.is_empty() {
            bail!("caption track for video {video_id} is empty");
        }
        Ok(text)
    }
}

#[async_trait]
impl CaptionSource for InnerTubeCaptions {
    async fn fetch_transcript(&self, video_id: &str) -> Result<String> {
        self.fetch_captions(video_id).await
    }
}

fn extract_api_key(html: &str) -> Result<String> {
    let re = Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#)?;
    if let Some(caps) = re.captures(html) {
        return Ok(caps[1].to_string());
    }

    // Fallback: try the newer pattern
    let re2 = Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#)?;
    if let Some(caps) = re2.captures(html) {
        return Ok(caps[1].to_string());
    }

    if html.contains("g-recaptcha") || html.contains("unusual traffic") {
        bail!("watch page returned a captcha (unusual traffic from this network)");
    }

    bail!("could not extract InnerTube API key from watch page");
}

/// Manual English, then generated English, then any English variant,
/// then anything that can be translated to English
fn select_track(tracks: &[CaptionTrack]) -> Option<TrackChoice<'_>> {
    let english = |t: &&CaptionTrack| t.language_code == "en";

    tracks
        .iter()
        .filter(english)
        .find(|t| !t.is_generated())
        .or_else(|| tracks.iter().filter(english).find(|t| t.is_generated()))
        .or_else(|| tracks.iter().find(|t| t.is_english_variant()))
        .map(TrackChoice::Native)
        .or_else(|| tracks.iter().find(|t| t.is_translatable).map(TrackChoice::Translated))
}

#[derive(Debug)]
struct Cue {
    start: f64,
    text: String,
}

fn join_cues(mut cues: Vec<Cue>) -> String {
    cues.sort_by(|a, b| a.start.total_cmp(&b.start));
    cues.iter()
        .map(|c| c.text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Cue>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut cues = Vec::new();
    let mut current_start: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                current_start = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.as_ref() == b"start")
                    .and_then(|attr| String::from_utf8_lossy(&attr.value).parse::<f64>().ok());
            }
            Ok(Event::Empty(_)) => {
                // Self-closing <text .../> with no content
            }
            Ok(Event::Text(ref e)) => {
                if let Some(start) = current_start.take() {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).to_string();
                    if !text.trim().is_empty() {
                        cues.push(Cue { start, text });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML: {e}"),
            _ => {}
        }
    }

    Ok(cues)
}
