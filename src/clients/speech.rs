use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use futures::future::BoxFuture;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::clients::{preview, ClientError};

#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Plain text recognized from the audio file at `path`.
    async fn transcribe(&self, path: &Path) -> Result<String, ClientError>;
}

/// Speech recognition through an OpenAI-compatible `/v1/audio/transcriptions`
/// endpoint.
pub struct WhisperApiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
    max_upload_bytes: u64,
}

impl WhisperApiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        max_upload_bytes: u64,
    ) -> Result<Self, ClientError> {
        let api_key = api_key.ok_or(ClientError::NotConfigured("STT_API_KEY"))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            max_upload_bytes,
        })
    }
}

#[async_trait]
impl SpeechToText for WhisperApiClient {
    async fn transcribe(&self, path: &Path) -> Result<String, ClientError> {
        let size = tokio::fs::metadata(path).await?.len();
        if size > self.max_upload_bytes {
            return Err(ClientError::TooLarge {
                bytes: size,
                limit: self.max_upload_bytes,
            });
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .http
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Unavailable(format!(
                "transcription returned {}: {}",
                status,
                preview(&body, 200)
            )));
        }

        let json: Value = serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))?;
        json["text"]
            .as_str()
            .map(|text| text.trim().to_string())
            .ok_or_else(|| ClientError::Parse("transcription response has no text".to_string()))
    }
}

type SpeechLoader =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn SpeechToText>, ClientError>> + Send + Sync>;

/// Defers building the speech model until the first transcription request.
/// Concurrent first calls share one initialization; a failed load is retried
/// on the next call.
pub struct LazySpeechModel {
    cell: OnceCell<Arc<dyn SpeechToText>>,
    loader: SpeechLoader,
}

impl LazySpeechModel {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<Arc<dyn SpeechToText>, ClientError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            cell: OnceCell::new(),
            loader: Box::new(loader),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    async fn model(&self) -> Result<&Arc<dyn SpeechToText>, ClientError> {
        self.cell
            .get_or_try_init(|| async {
                log::info!("Loading speech recognition model");
                (self.loader)().await
            })
            .await
    }
}

#[async_trait]
impl SpeechToText for LazySpeechModel {
    async fn transcribe(&self, path: &Path) -> Result<String, ClientError> {
        self.model().await?.transcribe(path).await
    }
}
