use std::sync::Arc;

use log::{error, info};

use crate::error::AppError;
use crate::prompt::build_prompt;
use crate::summarize::Summarizer;
use crate::transcript::TranscriptChain;
use crate::{SourceKind, SummaryResult, SummaryStyle, VideoMetadata, extract_video_id};

/// Result of summarizing one video
#[derive(Debug, Clone)]
pub struct VideoSummary {
    pub metadata: VideoMetadata,
    pub transcript_length: usize,
    pub result: SummaryResult,
}

/// Request-level orchestration: input → transcript → prompt → summary
#[derive(Clone)]
pub struct SummaryService {
    chain: TranscriptChain,
    summarizer: Arc<dyn Summarizer>,
}

impl SummaryService {
    pub fn new(chain: TranscriptChain, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { chain, summarizer }
    }

    pub fn llm_configured(&self) -> bool {
        self.summarizer.is_configured()
    }

    /// Summarize raw text or a video link; `url` sources are not fetched
    pub async fn summarize_source(
        &self,
        source_type: &str,
        source: &str,
        style: SummaryStyle,
    ) -> Result<String, AppError> {
        let kind = SourceKind::parse(source_type).ok_or_else(|| AppError::invalid("Unsupported source type"))?;

        if source.trim().is_empty() {
            return Err(AppError::invalid("Source must not be empty"));
        }

        let transcript = match kind {
            SourceKind::Text => source.to_string(),
            SourceKind::Url => return Ok(url_placeholder(source)),
            SourceKind::Video => {
                let video_id = extract_video_id(source).ok_or_else(|| AppError::invalid("Invalid YouTube URL"))?;
                self.chain.acquire(&video_id).await.inspect_err(log_failure)?.text
            }
        };

        let result = self.summarize_transcript(&transcript, None, style).await?;
        Ok(result.text)
    }

    /// Full video pipeline with metadata and timing
    pub async fn summarize_video(&self, video_url: &str, style: SummaryStyle) -> Result<VideoSummary, AppError> {
        let video_id = extract_video_id(video_url).ok_or_else(|| AppError::invalid("Invalid YouTube URL"))?;
        info!("Processing video: {video_id}");

        let (transcript, metadata) = self
            .chain
            .acquire_with_metadata(&video_id)
            .await
            .inspect_err(log_failure)?;
        info!(
            "Video data fetched: {} (transcript via {}, {} chars)",
            metadata.title,
            transcript.source,
            transcript.text.len()
        );

        let result = self
            .summarize_transcript(&transcript.text, Some(&metadata.title), style)
            .await?;

        Ok(VideoSummary {
            transcript_length: transcript.text.chars().count(),
            metadata,
            result,
        })
    }

    async fn summarize_transcript(
        &self,
        transcript: &str,
        title: Option<&str>,
        style: SummaryStyle,
    ) -> Result<SummaryResult, AppError> {
        info!("Generating {style} summary");
        let prompt = build_prompt(transcript, title, style);
        let generated = self.summarizer.summarize(&prompt).await?;
        Ok(SummaryResult {
            text: generated.text,
            style,
            processing_time_seconds: generated.elapsed_seconds,
        })
    }
}

/// Stand-in for web page extraction, which this service does not do
pub fn url_placeholder(source: &str) -> String {
    format!("Content extracted from {source}")
}

fn log_failure(failure: &crate::error::AcquisitionFailure) {
    error!("{failure}");
}
