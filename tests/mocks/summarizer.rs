use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use summtube::error::SummarizationFailure;
use summtube::summarize::{Generated, Summarizer};

#[derive(Clone)]
pub struct MockSummarizer {
    pub summary: String,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<SummarizationFailure>,
}

impl MockSummarizer {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(failure: SummarizationFailure) -> Self {
        Self {
            summary: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(failure),
        }
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<Generated, SummarizationFailure> {
        self.calls.lock().unwrap().push(prompt.to_string());
        if let Some(ref failure) = self.fail_with {
            return Err(failure.clone());
        }
        Ok(Generated {
            text: self.summary.clone(),
            elapsed_seconds: 0.42,
        })
    }

    fn is_configured(&self) -> bool {
        true
    }
}
