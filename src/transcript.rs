use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, bail};
use log::{debug, info, warn};
use tokio::sync::OnceCell;

use crate::error::AcquisitionFailure;
use crate::subtitle::payload_to_text;
use crate::ytdlp::{MediaInfo, SubtitleTrack};
use crate::{Transcript, TranscriptSource, VideoMetadata};

/// Dedicated caption-listing service (strategy 1)
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn fetch_transcript(&self, video_id: &str) -> Result<String>;
}

/// General media-metadata extractor (strategy 2, 3 and metadata)
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    async fn extract_info(&self, video_id: &str) -> Result<MediaInfo>;
}

/// Single-attempt download of a caption file
#[async_trait]
pub trait SubtitleFetcher: Send + Sync {
    async fn download(&self, url: &str) -> Result<String>;
}

/// Downloads caption files over HTTP with a per-attempt timeout
#[derive(Debug, Clone)]
pub struct HttpSubtitleFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpSubtitleFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl SubtitleFetcher for HttpSubtitleFetcher {
    async fn download(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        let status = resp.status();
        if !status.is_success() {
            bail!("caption download returned HTTP Error {}", status.as_u16());
        }

        Ok(resp.text().await.map_err(|e| e.without_url())?)
    }
}

/// Bounded exponential backoff: `base_delay`, then doubled each attempt
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Retry an async operation with exponential backoff
pub async fn retry<F, Fut, T>(policy: RetryPolicy, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..policy.max_attempts.max(1) {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if attempt + 1 < policy.max_attempts {
                    let delay = policy.base_delay * 2u32.pow(attempt);
                    debug!("Attempt {} failed: {e}, retrying in {delay:?}", attempt + 1);
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
        }
    }
    match last_err {
        Some(e) => Err(e),
        None => bail!("retry called with zero attempts"),
    }
}

/// Ordered fallback chain that turns a video ID into a transcript
#[derive(Clone)]
pub struct TranscriptChain {
    captions: Arc<dyn CaptionSource>,
    extractor: Arc<dyn MediaExtractor>,
    fetcher: Arc<dyn SubtitleFetcher>,
    retry: RetryPolicy,
}

/// Extractor output, computed at most once per video lookup
type InfoCell = OnceCell<std::result::Result<MediaInfo, String>>;

impl TranscriptChain {
    pub fn new(
        captions: Arc<dyn CaptionSource>,
        extractor: Arc<dyn MediaExtractor>,
        fetcher: Arc<dyn SubtitleFetcher>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            captions,
            extractor,
            fetcher,
            retry,
        }
    }

    /// Produce a transcript, trying each strategy until one yields text
    pub async fn acquire(&self, video_id: &str) -> std::result::Result<Transcript, AcquisitionFailure> {
        let info = InfoCell::new();
        self.acquire_with(video_id, &info).await
    }

    /// Transcript plus best-effort metadata, sharing a single extractor run
    pub async fn acquire_with_metadata(
        &self,
        video_id: &str,
    ) -> std::result::Result<(Transcript, VideoMetadata), AcquisitionFailure> {
        let info = InfoCell::new();
        let transcript = self.acquire_with(video_id, &info).await?;
        let metadata = self.metadata_with(video_id, &info).await;
        Ok((transcript, metadata))
    }

    /// Title, duration and thumbnail; placeholders when the extractor fails
    pub async fn metadata(&self, video_id: &str) -> VideoMetadata {
        let info = InfoCell::new();
        self.metadata_with(video_id, &info).await
    }

    async fn metadata_with(&self, video_id: &str, info: &InfoCell) -> VideoMetadata {
        match self.info(video_id, info).await {
            Ok(info) => info.metadata(video_id),
            Err(e) => {
                warn!("Metadata unavailable for {video_id}, using placeholders: {e}");
                VideoMetadata::placeholder(video_id)
            }
        }
    }

    async fn info<'a>(&self, video_id: &str, cell: &'a InfoCell) -> std::result::Result<&'a MediaInfo, &'a str> {
        cell.get_or_init(|| async {
            self.extractor
                .extract_info(video_id)
                .await
                .map_err(|e| format!("{e:#}"))
        })
        .await
        .as_ref()
        .map_err(String::as_str)
    }

    async fn acquire_with(
        &self,
        video_id: &str,
        info: &InfoCell,
    ) -> std::result::Result<Transcript, AcquisitionFailure> {
        let mut reasons = Vec::new();

        match self.captions.fetch_transcript(video_id).await {
            Ok(text) if !text.trim().is_empty() => {
                info!("Transcript for {video_id} from caption api ({} chars)", text.len());
                return Ok(Transcript {
                    text,
                    source: TranscriptSource::CaptionApi,
                });
            }
            Ok(_) => reasons.push("caption api: empty transcript".to_string()),
            Err(e) => reasons.push(format!("caption api: {e:#}")),
        }
        warn!("Caption api failed for {video_id}: {}", reasons[0]);

        let media = self.info(video_id, info).await;

        let reason = match media {
            Ok(media) => match media.preferred_track() {
                Some(track) => match self.download_once(&track).await {
                    Ok(text) => {
                        info!(
                            "Transcript for {video_id} from extractor track {} ({} chars)",
                            track.language,
                            text.len()
                        );
                        return Ok(Transcript {
                            text,
                            source: TranscriptSource::Extractor,
                        });
                    }
                    Err(e) => format!("extractor: {e:#}"),
                },
                None => "extractor: no English subtitle or automatic caption track".to_string(),
            },
            Err(e) => format!("extractor: {e}"),
        };
        warn!("Extractor strategy failed for {video_id}: {reason}");
        reasons.push(reason);

        let reason = match media.ok().and_then(MediaInfo::fallback_track) {
            Some(track) => match self.download_with_retry(&track).await {
                Ok(text) => {
                    info!("Transcript for {video_id} from direct download ({} chars)", text.len());
                    return Ok(Transcript {
                        text,
                        source: TranscriptSource::DirectDownload,
                    });
                }
                Err(e) => format!("direct download: {e:#}"),
            },
            None => "direct download: no caption track URL available".to_string(),
        };
        warn!("Direct download failed for {video_id}: {reason}");
        reasons.push(reason);

        Err(AcquisitionFailure { reasons })
    }

    async fn download_once(&self, track: &SubtitleTrack) -> Result<String> {
        let payload = self.fetcher.download(&track.url).await?;
        let text = payload_to_text(&track.format, &payload)?;
        if text.is_empty() {
            bail!("{} caption track is empty", track.language);
        }
        Ok(text)
    }

    async fn download_with_retry(&self, track: &SubtitleTrack) -> Result<String> {
        let payload = retry(self.retry, || self.fetcher.download(&track.url))
            .await
            .map_err(|e| eyre::eyre!("YouTube rate limit exceeded. Please try again later. ({e:#})"))?;

        let text = payload_to_text(&track.format, &payload)?;
        if text.is_empty() {
            bail!("{} caption track is empty", track.language);
        }
        Ok(text)
    }
}
