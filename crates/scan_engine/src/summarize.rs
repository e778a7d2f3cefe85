use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use scan_logging::{scan_debug, scan_warn};
use thiserror::Error;

use scan_core::is_unavailable;

const CHUNK_PROMPT: &str = "Summarize technical skills and duties in this job text:";
const FINAL_PROMPT: &str =
    "Write a professional paragraph job summary listing tech stack and responsibilities:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummarizeError {
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model returned http {0}")]
    Status(u16),
    #[error("unexpected model response: {0}")]
    Response(String),
    #[error("model returned empty text")]
    Empty,
}

/// Compresses a job description. Implementations never fail: on any problem
/// the original text comes back unchanged.
pub trait Summarizer {
    fn summarize(&self, description: &str) -> String;
}

/// Used when no model is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughSummarizer;

impl Summarizer for PassthroughSummarizer {
    fn summarize(&self, description: &str) -> String {
        description.to_string()
    }
}

/// Text-generation backend behind [`ChunkedSummarizer`].
#[async_trait::async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String, SummarizeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizerSettings {
    /// Descriptions with fewer words are kept as they are.
    pub min_words: usize,
    pub chunk_words: usize,
    pub chunk_max_tokens: u32,
    pub final_max_tokens: u32,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            min_words: 80,
            chunk_words: 450,
            chunk_max_tokens: 150,
            final_max_tokens: 300,
        }
    }
}

/// Two-stage map/reduce summary: each word chunk is summarized, then the
/// partial summaries are merged into one paragraph.
pub struct ChunkedSummarizer<M: TextModel> {
    model: M,
    settings: SummarizerSettings,
    runtime: tokio::runtime::Runtime,
}

impl<M: TextModel> ChunkedSummarizer<M> {
    pub fn new(model: M, settings: SummarizerSettings) -> std::io::Result<Self> {
        Ok(Self {
            model,
            settings,
            runtime: tokio::runtime::Runtime::new()?,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub async fn summarize_async(&self, description: &str) -> Result<String, SummarizeError> {
        let words: Vec<&str> = description.split_whitespace().collect();
        let mut partials = Vec::new();
        for chunk in words.chunks(self.settings.chunk_words.max(1)) {
            let prompt = format!("{CHUNK_PROMPT} \n\n{}", chunk.join(" "));
            partials.push(
                self.model
                    .generate(&prompt, self.settings.chunk_max_tokens)
                    .await?,
            );
        }
        let prompt = format!("{FINAL_PROMPT} \n\n{}", partials.join(" "));
        let summary = self
            .model
            .generate(&prompt, self.settings.final_max_tokens)
            .await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(SummarizeError::Empty);
        }
        Ok(summary.to_string())
    }

    fn is_short(&self, description: &str) -> bool {
        description.split_whitespace().count() < self.settings.min_words
    }
}

impl<M: TextModel> Summarizer for ChunkedSummarizer<M> {
    fn summarize(&self, description: &str) -> String {
        if is_unavailable(description) || self.is_short(description) {
            return description.to_string();
        }
        match self.runtime.block_on(self.summarize_async(description)) {
            Ok(summary) => summary,
            Err(err) => {
                scan_warn!("summary failed, keeping original text: {err}");
                description.to_string()
            }
        }
    }
}

/// Client for a hosted text-generation endpoint that takes
/// `{"inputs", "parameters": {"max_new_tokens"}}` and answers
/// `[{"generated_text"}]` or `{"generated_text"}`.
#[derive(Debug, Clone)]
pub struct HttpTextModel {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpTextModel {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SummarizeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SummarizeError::Request(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }
}

#[async_trait::async_trait]
impl TextModel for HttpTextModel {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String, SummarizeError> {
        let body = serde_json::json!({
            "inputs": prompt,
            "parameters": { "max_new_tokens": max_new_tokens },
        });
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|err| SummarizeError::Request(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SummarizeError::Status(status.as_u16()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| SummarizeError::Request(err.to_string()))?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|err| SummarizeError::Response(err.to_string()))?;
        let text = generated_text(&value)
            .ok_or_else(|| SummarizeError::Response(value.to_string()))?;
        scan_debug!("model returned {} chars", text.len());
        Ok(text)
    }
}

fn generated_text(value: &serde_json::Value) -> Option<String> {
    let item = match value {
        serde_json::Value::Array(items) => items.first()?,
        other => other,
    };
    item.get("generated_text")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_text_accepts_list_or_object() {
        let list = serde_json::json!([{ "generated_text": "a" }]);
        let object = serde_json::json!({ "generated_text": "b" });
        assert_eq!(generated_text(&list).as_deref(), Some("a"));
        assert_eq!(generated_text(&object).as_deref(), Some("b"));
        assert_eq!(generated_text(&serde_json::json!({ "error": "x" })), None);
    }
}
