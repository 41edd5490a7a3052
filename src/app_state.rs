use std::{sync::Arc, time::Duration};

use futures::FutureExt;
use secrecy::{ExposeSecret, SecretString};

use crate::{
    clients::{
        build_http_client, AudioDownloader, CaptionSource, ChatCompletionsClient, GenerationBackend,
        LazySpeechModel, OpenAiEmbeddingClient, PineconeClient, SpeechToText, UnconfiguredBackend,
        WhisperApiClient, YouTubeCaptionClient, YtDlpAudioDownloader,
    },
    config::Config,
    errors::{AppError, AppResult},
    services::{
        metrics::Metrics,
        question_generator::{QuestionGenerator, RetryPolicy},
        quiz_service::QuizService,
        transcript_service::{TranscriptService, TranscriptSettings},
        vector_service::TranscriptIndexer,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: Arc<QuizService>,
    pub transcript_service: Arc<TranscriptService>,
    pub metrics: Arc<Metrics>,
    pub config: Arc<Config>,
}

/// External collaborators the services are built from.
pub struct Collaborators {
    pub captions: Arc<dyn CaptionSource>,
    pub downloader: Arc<dyn AudioDownloader>,
    pub speech: Arc<dyn SpeechToText>,
    pub backend: Arc<dyn GenerationBackend>,
    pub indexer: Option<Arc<TranscriptIndexer>>,
    pub retry: RetryPolicy,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let http = build_http_client(Duration::from_secs(config.http_timeout_seconds))
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let captions = Arc::new(YouTubeCaptionClient::new(
            http.clone(),
            config.yt_dlp_path.clone(),
            Duration::from_secs(config.http_timeout_seconds),
        ));
        let downloader = Arc::new(YtDlpAudioDownloader::new(
            config.yt_dlp_path.clone(),
            config.audio_temp_dir.clone(),
            Duration::from_secs(config.download_timeout_seconds),
        ));

        let backend: Arc<dyn GenerationBackend> = match &config.llm_api_key {
            Some(key) => Arc::new(ChatCompletionsClient::new(
                http.clone(),
                &config.llm_base_url,
                config.llm_model.clone(),
                copy_secret(key),
            )),
            None => {
                log::warn!("LLM_API_KEY not set; quizzes will use placeholder questions");
                Arc::new(UnconfiguredBackend)
            }
        };

        let collaborators = Collaborators {
            captions,
            downloader,
            speech: Arc::new(lazy_speech_model(&config)?),
            backend,
            indexer: transcript_indexer(&config, &http),
            retry: RetryPolicy::default(),
        };

        Ok(Self::from_parts(config, collaborators))
    }

    pub fn from_parts(config: Config, collaborators: Collaborators) -> Self {
        let metrics = Arc::new(Metrics::new());

        let transcript_service = Arc::new(TranscriptService::new(
            collaborators.captions,
            collaborators.downloader,
            collaborators.speech,
            TranscriptSettings {
                min_chars: config.min_transcript_chars,
                cookie_file: config.yt_cookies_path.clone(),
            },
        ));

        let generator = QuestionGenerator::new(collaborators.backend, collaborators.retry);
        let quiz_service = Arc::new(QuizService::new(
            Arc::clone(&transcript_service),
            generator,
            collaborators.indexer,
            Arc::clone(&metrics),
            config.generation_concurrency,
        ));

        Self {
            quiz_service,
            transcript_service,
            metrics,
            config: Arc::new(config),
        }
    }
}

fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

// The speech client is built on first use so a missing key only matters
// when a video has no captions at all. Uploads get the download timeout.
fn lazy_speech_model(config: &Config) -> AppResult<LazySpeechModel> {
    let http = build_http_client(Duration::from_secs(config.download_timeout_seconds))
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let base_url = config.stt_base_url.clone();
    let model = config.stt_model.clone();
    let api_key = config.stt_api_key.as_ref().map(copy_secret);
    let max_upload_bytes = config.stt_max_upload_bytes;

    Ok(LazySpeechModel::new(move || {
        let client = WhisperApiClient::new(
            http.clone(),
            &base_url,
            model.clone(),
            api_key.as_ref().map(copy_secret),
            max_upload_bytes,
        );
        async move { client.map(|c| Arc::new(c) as Arc<dyn SpeechToText>) }.boxed()
    }))
}

fn transcript_indexer(config: &Config, http: &reqwest::Client) -> Option<Arc<TranscriptIndexer>> {
    let (Some(embedding_key), Some(pinecone_key), Some(host)) = (
        &config.embedding_api_key,
        &config.pinecone_api_key,
        &config.pinecone_index_host,
    ) else {
        log::info!("Vector storage not configured; skipping transcript indexing");
        return None;
    };

    let embeddings = Arc::new(OpenAiEmbeddingClient::new(
        http.clone(),
        &config.embedding_base_url,
        config.embedding_model.clone(),
        copy_secret(embedding_key),
    ));
    let store = Arc::new(PineconeClient::new(http.clone(), host, copy_secret(pinecone_key)));
    Some(Arc::new(TranscriptIndexer::new(embeddings, store)))
}
