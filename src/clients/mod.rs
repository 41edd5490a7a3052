//! Narrow interfaces to the services the quiz pipeline depends on, together
//! with their production implementations.

pub mod audio;
pub mod captions;
pub mod llm;
pub mod speech;
pub mod vector;

use std::time::Duration;

use thiserror::Error;

pub use audio::{AudioDownloader, DownloadedAudio, YtDlpAudioDownloader};
pub use captions::{CaptionSource, YouTubeCaptionClient};
pub use llm::{
    BackendError, ChatCompletionsClient, GenerationBackend, Prompt, ResponseEnvelope,
    UnconfiguredBackend,
};
pub use speech::{LazySpeechModel, SpeechToText, WhisperApiClient};
pub use vector::{EmbeddingBackend, OpenAiEmbeddingClient, PineconeClient, VectorRecord, VectorStore};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("file is {bytes} bytes, over the {limit} byte upload limit")]
    TooLarge { bytes: u64, limit: u64 },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

pub(crate) fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// First `limit` characters of `text`, for log lines and error messages.
pub(crate) fn preview(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
