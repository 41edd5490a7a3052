use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;

use crate::clients::preview;

const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 1200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Error)]
pub enum BackendError {
    /// Network failures, timeouts and 5xx responses. Worth retrying.
    #[error("transient backend failure: {0}")]
    Transient(String),

    #[error("backend rejected the request ({status}): {body}")]
    Permanent { status: u16, body: String },

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("generation backend is not configured")]
    NotConfigured,
}

impl BackendError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }

    fn from_status(status: StatusCode, body: &str) -> Self {
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            BackendError::Transient(format!("{}: {}", status, preview(body, 200)))
        } else {
            BackendError::Permanent {
                status: status.as_u16(),
                body: preview(body, 200),
            }
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transient(err.to_string())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Sends one prompt and returns the raw text the model produced.
    async fn complete(&self, prompt: &Prompt) -> Result<String, BackendError>;
}

/// The shapes an OpenAI-compatible completion response can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    ChatMessage(String),
    CompletionText(String),
    RawMessage(String),
    OutputText(String),
    Unrecognized(Value),
}

type EnvelopeStrategy = fn(&Value) -> Option<ResponseEnvelope>;

const ENVELOPE_STRATEGIES: &[EnvelopeStrategy] =
    &[chat_message, completion_text, raw_message, output_text];

fn chat_message(body: &Value) -> Option<ResponseEnvelope> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| ResponseEnvelope::ChatMessage(s.to_string()))
}

fn completion_text(body: &Value) -> Option<ResponseEnvelope> {
    body["choices"][0]["text"]
        .as_str()
        .map(|s| ResponseEnvelope::CompletionText(s.to_string()))
}

fn raw_message(body: &Value) -> Option<ResponseEnvelope> {
    let message = &body["choices"][0]["message"];
    (message.is_object() || message.is_array())
        .then(|| ResponseEnvelope::RawMessage(message.to_string()))
}

fn output_text(body: &Value) -> Option<ResponseEnvelope> {
    body["output_text"]
        .as_str()
        .or_else(|| body["output"].as_str())
        .map(|s| ResponseEnvelope::OutputText(s.to_string()))
}

impl ResponseEnvelope {
    pub fn classify(body: Value) -> Self {
        ENVELOPE_STRATEGIES
            .iter()
            .find_map(|strategy| strategy(&body))
            .unwrap_or(ResponseEnvelope::Unrecognized(body))
    }

    pub fn into_text(self) -> Result<String, BackendError> {
        match self {
            ResponseEnvelope::ChatMessage(text)
            | ResponseEnvelope::CompletionText(text)
            | ResponseEnvelope::RawMessage(text)
            | ResponseEnvelope::OutputText(text) => Ok(text),
            ResponseEnvelope::Unrecognized(body) => Err(BackendError::MalformedResponse(
                preview(&body.to_string(), 200),
            )),
        }
    }
}

/// Client for any `/v1/chat/completions` compatible endpoint.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl ChatCompletionsClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        model: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    fn request_body(&self, prompt: &Prompt) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user }
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS
        })
    }
}

#[async_trait]
impl GenerationBackend for ChatCompletionsClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, BackendError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::from_status(status, &body));
        }

        let json: Value = serde_json::from_str(&body)
            .map_err(|e| BackendError::MalformedResponse(format!("{}: {}", e, preview(&body, 200))))?;
        let envelope = ResponseEnvelope::classify(json);
        log::debug!("Completion envelope resolved: {:?}", envelope_kind(&envelope));
        envelope.into_text()
    }
}

fn envelope_kind(envelope: &ResponseEnvelope) -> &'static str {
    match envelope {
        ResponseEnvelope::ChatMessage(_) => "chat_message",
        ResponseEnvelope::CompletionText(_) => "completion_text",
        ResponseEnvelope::RawMessage(_) => "raw_message",
        ResponseEnvelope::OutputText(_) => "output_text",
        ResponseEnvelope::Unrecognized(_) => "unrecognized",
    }
}

/// Stand-in used when no API key is configured. Every quiz then falls back to
/// placeholder questions.
pub struct UnconfiguredBackend;

#[async_trait]
impl GenerationBackend for UnconfiguredBackend {
    async fn complete(&self, _prompt: &Prompt) -> Result<String, BackendError> {
        Err(BackendError::NotConfigured)
    }
}
