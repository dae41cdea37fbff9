use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;
use crate::llm::provider::{GenerationError, GenerationResult, LLMProvider};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Error body fragments the API uses when a prompt exceeds the context window.
const OVERFLOW_MARKERS: &[&str] = &[
    "prompt is too long",
    "context length",
    "context window",
    "maximum context",
    "too many tokens",
    "request too large",
];

pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
    system: &'a str,
}

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    error: Option<ClaudeError>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ClaudeError {
    message: String,
}

impl ClaudeProvider {
    pub fn new(api_key: String, model: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GenerationError::from)?;

        Ok(Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

#[async_trait]
impl LLMProvider for ClaudeProvider {
    async fn generate(
        &self,
        system_role: &str,
        user_content: &str,
        max_output_tokens: u32,
    ) -> GenerationResult<String> {
        tracing::debug!(
            "Sending {} chars to {} (max {} output tokens)",
            user_content.len(),
            self.model,
            max_output_tokens
        );

        let request_body = ClaudeRequest {
            model: &self.model,
            max_tokens: max_output_tokens,
            system: system_role,
            messages: vec![ClaudeMessage {
                role: "user",
                content: user_content,
            }],
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let result: ClaudeResponse = response.json().await.map_err(|e| {
            GenerationError::Transport(format!("Failed to parse Claude response: {}", e))
        })?;

        if let Some(error) = result.error {
            return Err(classify_message(error.message));
        }

        let text = result
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(GenerationError::Transport("Empty response from Claude".to_string()));
        }

        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        "Claude"
    }
}

/// Map a non-success HTTP response to a structured generation error.
pub fn classify_failure(status: StatusCode, body: &str) -> GenerationError {
    let detail = format!("Claude API error ({}): {}", status, body);
    if status == StatusCode::PAYLOAD_TOO_LARGE
        || (status == StatusCode::BAD_REQUEST && mentions_overflow(body))
    {
        GenerationError::Overflow(detail)
    } else {
        GenerationError::Transport(detail)
    }
}

fn classify_message(message: String) -> GenerationError {
    if mentions_overflow(&message) {
        GenerationError::Overflow(message)
    } else {
        GenerationError::Transport(message)
    }
}

fn mentions_overflow(body: &str) -> bool {
    let lower = body.to_lowercase();
    OVERFLOW_MARKERS.iter().any(|m| lower.contains(m))
}
