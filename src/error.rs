use thiserror::Error;

/// Substrings in upstream errors that mean the platform is blocking or throttling us
const THROTTLE_MARKERS: &[&str] = &[
    "http error 429",
    "status 429",
    "too many requests",
    "rate limit",
    "sign in to confirm",
    "not a bot",
    "unusual traffic",
    "captcha",
];

/// Substrings in provider errors that mean quota exhaustion or overload
const PROVIDER_LIMIT_MARKERS: &[&str] = &[
    "resource_exhausted",
    "resource has been exhausted",
    "quota",
    "overloaded",
    "rate limit",
];

pub const RETRY_LATER_MESSAGE: &str =
    "YouTube is temporarily blocking or rate-limiting transcript requests. Please try again later.";

pub const CAPTIONS_UNAVAILABLE_MESSAGE: &str = "Captions are unavailable or restricted for this video.";

/// Every transcript strategy failed; one reason per strategy, in the order they ran
#[derive(Debug, Clone, Error)]
#[error("transcript acquisition failed: {}", .reasons.join("; "))]
pub struct AcquisitionFailure {
    pub reasons: Vec<String>,
}

impl AcquisitionFailure {
    /// Whether any strategy failed in a way that looks like bot detection or throttling
    pub fn is_throttled(&self) -> bool {
        self.reasons.iter().any(|r| is_throttle_message(r))
    }

    pub fn user_message(&self) -> &'static str {
        if self.is_throttled() {
            RETRY_LATER_MESSAGE
        } else {
            CAPTIONS_UNAVAILABLE_MESSAGE
        }
    }
}

pub fn is_throttle_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    THROTTLE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Failure from the LLM provider
#[derive(Debug, Clone, Error)]
pub enum SummarizationFailure {
    #[error("AI service overloaded: {0}")]
    RateLimited(String),

    #[error("failed to generate summary: {0}")]
    GenerationFailed(String),
}

impl SummarizationFailure {
    /// Classify a provider failure from its HTTP status (if any) and message
    pub fn classify(status: Option<u16>, detail: String) -> Self {
        let lower = detail.to_ascii_lowercase();
        let limited =
            matches!(status, Some(429) | Some(529)) || PROVIDER_LIMIT_MARKERS.iter().any(|m| lower.contains(m));
        if limited {
            SummarizationFailure::RateLimited(detail)
        } else {
            SummarizationFailure::GenerationFailed(detail)
        }
    }
}

/// Request-level error, mapped to a status code at the HTTP boundary
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{}", .0.user_message())]
    UpstreamUnavailable(AcquisitionFailure),

    #[error("AI service is rate limited. Please try again later.")]
    ProviderRateLimited(String),

    #[error("Failed to generate summary: {0}")]
    ProviderError(String),

    #[error("Internal server error")]
    Unexpected(eyre::Report),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) => 400,
            AppError::UpstreamUnavailable(_) => 400,
            AppError::ProviderRateLimited(_) => 429,
            AppError::ProviderError(_) => 500,
            AppError::Unexpected(_) => 500,
        }
    }
}

impl From<eyre::Report> for AppError {
    fn from(report: eyre::Report) -> Self {
        AppError::Unexpected(report)
    }
}

impl From<AcquisitionFailure> for AppError {
    fn from(failure: AcquisitionFailure) -> Self {
        AppError::UpstreamUnavailable(failure)
    }
}

impl From<SummarizationFailure> for AppError {
    fn from(failure: SummarizationFailure) -> Self {
        match failure {
            SummarizationFailure::RateLimited(detail) => AppError::ProviderRateLimited(detail),
            SummarizationFailure::GenerationFailed(detail) => AppError::ProviderError(detail),
        }
    }
}
