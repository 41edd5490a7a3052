#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use vidquiz_server::{
    app_state::{AppState, Collaborators},
    clients::{
        AudioDownloader, BackendError, CaptionSource, ClientError, DownloadedAudio,
        GenerationBackend, Prompt, SpeechToText,
    },
    config::Config,
    models::domain::{CaptionTrack, TranscriptSegment},
    services::question_generator::RetryPolicy,
};

pub const VIDEO_ID: &str = "dQw4w9WgXcQ";

pub fn lecture(count: usize, duration: f64) -> Vec<TranscriptSegment> {
    (0..count)
        .map(|i| {
            TranscriptSegment::new(
                format!("in part {} the speaker explains how enzymes lower activation energy", i),
                i as f64 * duration,
                duration,
            )
        })
        .collect()
}

/// Captions served from memory. `None` means the tier has nothing.
#[derive(Default)]
pub struct InMemoryCaptions {
    pub default_segments: Option<Vec<TranscriptSegment>>,
    pub tracks: Vec<(CaptionTrack, Vec<TranscriptSegment>)>,
    pub default_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

#[async_trait]
impl CaptionSource for InMemoryCaptions {
    async fn fetch_default(&self, _: &str, _: &str) -> Result<Vec<TranscriptSegment>, ClientError> {
        self.default_calls.fetch_add(1, Ordering::SeqCst);
        self.default_segments
            .clone()
            .ok_or_else(|| ClientError::NotFound("no default captions".into()))
    }

    async fn list_tracks(&self, _: &str) -> Result<Vec<CaptionTrack>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.tracks.is_empty() {
            return Err(ClientError::NotFound("captions disabled".into()));
        }
        Ok(self.tracks.iter().map(|(track, _)| track.clone()).collect())
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<TranscriptSegment>, ClientError> {
        self.tracks
            .iter()
            .find(|(t, _)| t == track)
            .map(|(_, segments)| segments.clone())
            .ok_or_else(|| ClientError::NotFound(track.language.clone()))
    }
}

/// Writes a real file so removal can be observed.
pub struct TempFileDownloader {
    pub dir: PathBuf,
    pub created: Mutex<Vec<PathBuf>>,
    pub fail: bool,
}

impl TempFileDownloader {
    pub fn new(fail: bool) -> Self {
        Self {
            dir: std::env::temp_dir(),
            created: Mutex::new(Vec::new()),
            fail,
        }
    }

    pub fn created(&self) -> Vec<PathBuf> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioDownloader for TempFileDownloader {
    async fn download(
        &self,
        video_id: &str,
        _: Option<&Path>,
    ) -> Result<DownloadedAudio, ClientError> {
        if self.fail {
            return Err(ClientError::Unavailable("Private video".into()));
        }
        let path = self
            .dir
            .join(format!("{}-{}.mp3", video_id, uuid::Uuid::new_v4()));
        std::fs::write(&path, b"ID3")?;
        self.created.lock().unwrap().push(path.clone());
        Ok(DownloadedAudio {
            path,
            duration_seconds: Some(240.0),
        })
    }
}

pub struct ScriptedSpeech {
    pub text: Result<String, String>,
    pub calls: AtomicUsize,
}

impl ScriptedSpeech {
    pub fn ok(text: &str) -> Self {
        Self {
            text: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: Err("model crashed".to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SpeechToText for ScriptedSpeech {
    async fn transcribe(&self, path: &Path) -> Result<String, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists());
        self.text.clone().map_err(ClientError::Unavailable)
    }
}

/// Answers every prompt with one valid question at the requested difficulty.
pub struct ScriptedBackend {
    pub prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn complete(&self, prompt: &Prompt) -> Result<String, BackendError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let difficulty = ["easy", "medium", "hard"]
            .into_iter()
            .find(|d| prompt.user.contains(&format!("Target difficulty: {}", d)))
            .unwrap_or("medium");

        Ok(format!(
            "Sure! Here are your questions:\n```json\n[{{\"question_text\": \"What lowers activation energy?\", \"choices\": [\"Heat\", \"Enzymes\", \"Light\", \"Water\"], \"correct_choice\": 1, \"difficulty\": \"{}\", \"short_explanation\": \"Enzymes are catalysts.\"}}]\n```",
            difficulty
        ))
    }
}

pub struct UnreachableBackend {
    pub calls: AtomicUsize,
}

#[async_trait]
impl GenerationBackend for UnreachableBackend {
    async fn complete(&self, _: &Prompt) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::Transient("connection refused".into()))
    }
}

pub fn config() -> Config {
    let mut config = Config::from_env();
    config.min_transcript_chars = 100;
    config.default_questions = 5;
    config.generation_concurrency = 2;
    config.rate_limit_requests = 60;
    config.yt_cookies_path = None;
    config
}

pub fn state(
    captions: Arc<InMemoryCaptions>,
    downloader: Arc<TempFileDownloader>,
    speech: Arc<ScriptedSpeech>,
    backend: Arc<dyn GenerationBackend>,
) -> AppState {
    AppState::from_parts(
        config(),
        Collaborators {
            captions,
            downloader,
            speech,
            backend,
            indexer: None,
            retry: RetryPolicy::immediate(3),
        },
    )
}
