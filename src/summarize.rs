use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, error, info};

use crate::error::SummarizationFailure;

const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert summarizer. \
Output plain text only: no markdown, no headings, no emojis. \
Use short paragraphs and keep it concise and clean.";

/// Text returned by the provider and how long the call took
#[derive(Debug, Clone)]
pub struct Generated {
    pub text: String,
    pub elapsed_seconds: f64,
}

/// Sends a prompt to an LLM and returns the generated text
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<Generated, SummarizationFailure>;

    /// Whether a provider credential is configured
    fn is_configured(&self) -> bool;
}

/// Wire format, chosen from the model name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Anthropic,
    OpenAi,
}

impl Provider {
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("claude") {
            Provider::Anthropic
        } else if model.starts_with("gemini") {
            Provider::Gemini
        } else {
            Provider::OpenAi
        }
    }

    /// Provider-specific environment variable holding its credential
    pub fn key_env_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GOOGLE_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// HTTP client for the configured LLM provider
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    provider: Provider,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl LlmClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let model = model.into();
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            provider: Provider::for_model(&model),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, api_key: &str, prompt: &str) -> Result<String, SummarizationFailure> {
        let request = match self.provider {
            Provider::Gemini => self
                .client
                .post(format!(
                    "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                    self.model
                ))
                .header("x-goog-api-key", api_key)
                .json(&gemini_body(prompt)),
            Provider::Anthropic => self
                .client
                .post("https://api.anthropic.com/v1/messages")
                .header("x-api-key", api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&anthropic_body(&self.model, prompt)),
            Provider::OpenAi => self
                .client
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(api_key)
                .json(&openai_body(&self.model, prompt)),
        };

        let resp = request.send().await.map_err(transport_failure)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SummarizationFailure::classify(
                Some(status.as_u16()),
                format!("{:?} API returned {status}: {body}", self.provider),
            ));
        }

        let json: serde_json::Value = resp.json().await.map_err(transport_failure)?;
        let text = match self.provider {
            Provider::Gemini => extract_gemini_text(&json),
            Provider::Anthropic => extract_anthropic_text(&json),
            Provider::OpenAi => extract_openai_text(&json),
        };
        text.ok_or_else(|| {
            SummarizationFailure::GenerationFailed(format!("unexpected {:?} API response format", self.provider))
        })
    }
}

#[async_trait]
impl Summarizer for LlmClient {
    async fn summarize(&self, prompt: &str) -> Result<Generated, SummarizationFailure> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(SummarizationFailure::GenerationFailed(format!(
                "API key not configured (set {})",
                self.provider.key_env_var()
            )));
        };

        debug!("Summarizing via {:?} with model {}", self.provider, self.model);
        let started = Instant::now();
        let result = self.send(api_key, prompt).await;
        let elapsed_seconds = round2(started.elapsed().as_secs_f64());

        match result {
            Ok(text) => {
                info!("Summary generated in {elapsed_seconds:.2}s");
                Ok(Generated {
                    text: text.trim().to_string(),
                    elapsed_seconds,
                })
            }
            Err(e) => {
                error!("AI generation error after {elapsed_seconds:.2}s: {e}");
                Err(e)
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

fn transport_failure(e: reqwest::Error) -> SummarizationFailure {
    let status = e.status().map(|s| s.as_u16());
    let detail = if e.is_timeout() {
        "request to AI provider timed out".to_string()
    } else {
        e.without_url().to_string()
    };
    SummarizationFailure::classify(status, detail)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn gemini_body(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "systemInstruction": {
            "parts": [{ "text": DEFAULT_SYSTEM_PROMPT }]
        },
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": prompt }]
            }
        ]
    })
}

fn anthropic_body(model: &str, prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "max_tokens": 4096,
        "system": DEFAULT_SYSTEM_PROMPT,
        "messages": [
            {
                "role": "user",
                "content": prompt
            }
        ]
    })
}

fn openai_body(model: &str, prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [
            {
                "role": "system",
                "content": DEFAULT_SYSTEM_PROMPT
            },
            {
                "role": "user",
                "content": prompt
            }
        ]
    })
}

fn extract_gemini_text(json: &serde_json::Value) -> Option<String> {
    let parts = json
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text = parts
        .iter()
        .filter_map(|p| p.get("text")?.as_str())
        .collect::<Vec<_>>()
        .join("");
    (!text.is_empty()).then_some(text)
}

fn extract_anthropic_text(json: &serde_json::Value) -> Option<String> {
    let content = json.get("content")?.as_array()?;
    let text = content
        .iter()
        .filter_map(|block| {
            if block.get("type")?.as_str()? == "text" {
                block.get("text")?.as_str()
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("");
    (!text.is_empty()).then_some(text)
}

fn extract_openai_text(json: &serde_json::Value) -> Option<String> {
    json.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}
