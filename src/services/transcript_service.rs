use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;

use crate::{
    clients::{AudioDownloader, CaptionSource, ClientError, SpeechToText},
    errors::{AppResult, TranscriptUnavailable},
    models::domain::{
        transcript::join_segment_text, CaptionTrack, Transcript, TranscriptSegment,
        TranscriptSource,
    },
};

/// Caption languages the multi-language tier will accept.
pub const SUPPORTED_LANGUAGES: [&str; 8] = ["en", "bn", "hi", "es", "fr", "de", "ar", "zh"];

const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone)]
pub struct TranscriptSettings {
    pub min_chars: usize,
    pub cookie_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum TierError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("no caption track in a supported language")]
    NoMatchingTrack,

    #[error("transcript has {chars} characters, fewer than {min}")]
    TooShort { chars: usize, min: usize },
}

impl From<TierError> for TranscriptUnavailable {
    fn from(err: TierError) -> Self {
        match err {
            TierError::TooShort { chars, min } => TranscriptUnavailable::TooShort { chars, min },
            other => TranscriptUnavailable::NotFound(other.to_string()),
        }
    }
}

/// Acquires a transcript through exact-language captions, then any supported
/// caption track, then audio transcription.
pub struct TranscriptService {
    captions: Arc<dyn CaptionSource>,
    downloader: Arc<dyn AudioDownloader>,
    speech: Arc<dyn SpeechToText>,
    settings: TranscriptSettings,
}

impl TranscriptService {
    pub fn new(
        captions: Arc<dyn CaptionSource>,
        downloader: Arc<dyn AudioDownloader>,
        speech: Arc<dyn SpeechToText>,
        settings: TranscriptSettings,
    ) -> Self {
        Self {
            captions,
            downloader,
            speech,
            settings,
        }
    }

    pub async fn acquire(&self, video_id: &str, preferred_languages: &[String]) -> AppResult<Transcript> {
        let language = preferred_languages
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_LANGUAGE);

        match self.exact_language(video_id, language).await {
            Ok(transcript) => return Ok(transcript),
            Err(e) => log::info!("No {} captions for {}: {}", language, video_id, e),
        }

        match self.multi_language(video_id, preferred_languages).await {
            Ok(transcript) => return Ok(transcript),
            Err(e) => log::info!("No supported caption track for {}: {}", video_id, e),
        }

        log::warn!("No captions available for {}, transcribing audio", video_id);
        self.audio_transcription(video_id).await.map_err(|e| {
            log::warn!("Audio transcription failed for {}: {}", video_id, e);
            TranscriptUnavailable::from(e).into()
        })
    }

    async fn exact_language(&self, video_id: &str, language: &str) -> Result<Transcript, TierError> {
        let segments = self.captions.fetch_default(video_id, language).await?;
        self.accept(video_id, segments, TranscriptSource::ExactLanguage)
    }

    async fn multi_language(
        &self,
        video_id: &str,
        preferred_languages: &[String],
    ) -> Result<Transcript, TierError> {
        let tracks = self.captions.list_tracks(video_id).await?;
        let track = rank_tracks(tracks, preferred_languages)
            .into_iter()
            .next()
            .ok_or(TierError::NoMatchingTrack)?;

        log::info!(
            "Using {} captions in {} for {}",
            if track.is_manual { "manual" } else { "auto-generated" },
            track.language,
            video_id
        );
        let segments = self.captions.fetch_track(&track).await?;
        self.accept(video_id, segments, TranscriptSource::MultiLanguage)
    }

    async fn audio_transcription(&self, video_id: &str) -> Result<Transcript, TierError> {
        let audio = self
            .downloader
            .download(video_id, self.settings.cookie_file.as_deref())
            .await?;
        let file = TempAudioFile::new(audio.path);

        let text = self.speech.transcribe(file.path()).await?;
        let text = text.trim();
        let segments = if text.is_empty() {
            Vec::new()
        } else {
            let duration = audio.duration_seconds.unwrap_or(0.0);
            vec![TranscriptSegment::new(text, 0.0, duration)]
        };

        self.accept(video_id, segments, TranscriptSource::AudioTranscription)
    }

    fn accept(
        &self,
        video_id: &str,
        segments: Vec<TranscriptSegment>,
        source: TranscriptSource,
    ) -> Result<Transcript, TierError> {
        let chars = join_segment_text(&segments).chars().count();
        if chars < self.settings.min_chars {
            return Err(TierError::TooShort {
                chars,
                min: self.settings.min_chars,
            });
        }
        Ok(Transcript::new(video_id, segments, source))
    }
}

/// Supported tracks ordered best first: manual before auto-generated, then by
/// the caller's language preference, then by the supported-language order.
pub(crate) fn rank_tracks(tracks: Vec<CaptionTrack>, preferred: &[String]) -> Vec<CaptionTrack> {
    let mut ranked: Vec<(usize, CaptionTrack)> = tracks
        .into_iter()
        .filter_map(|track| supported_position(&track.language).map(|pos| (pos, track)))
        .collect();

    ranked.sort_by_key(|(supported, track)| {
        (!track.is_manual, preference_rank(&track.language, preferred), *supported)
    });

    ranked.into_iter().map(|(_, track)| track).collect()
}

fn primary_subtag(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn supported_position(language: &str) -> Option<usize> {
    let primary = primary_subtag(language);
    SUPPORTED_LANGUAGES.iter().position(|l| *l == primary)
}

// Any exact tag match outranks every primary-subtag match.
fn preference_rank(language: &str, preferred: &[String]) -> usize {
    let exact = preferred
        .iter()
        .position(|wanted| wanted.eq_ignore_ascii_case(language));
    if let Some(pos) = exact {
        return pos;
    }

    let primary = primary_subtag(language);
    preferred
        .iter()
        .position(|wanted| primary_subtag(wanted) == primary)
        .map(|pos| preferred.len() + pos)
        .unwrap_or(usize::MAX)
}

/// Removes the downloaded audio when dropped, whatever the outcome of the
/// transcription.
struct TempAudioFile {
    path: PathBuf,
}

impl TempAudioFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudioFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed temporary audio {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove temporary audio {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clients::{captions::MockCaptionSource, DownloadedAudio},
        errors::AppError,
        test_utils::fixtures::segments,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FailingDownloader;

    #[async_trait]
    impl AudioDownloader for FailingDownloader {
        async fn download(&self, _: &str, _: Option<&Path>) -> Result<DownloadedAudio, ClientError> {
            Err(ClientError::Unavailable("Private video".into()))
        }
    }

    struct FileDownloader {
        dir: PathBuf,
        created: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl AudioDownloader for FileDownloader {
        async fn download(&self, video_id: &str, _: Option<&Path>) -> Result<DownloadedAudio, ClientError> {
            let path = self.dir.join(format!("{}-{}.mp3", video_id, uuid::Uuid::new_v4()));
            std::fs::write(&path, b"ID3")?;
            self.created.lock().unwrap().push(path.clone());
            Ok(DownloadedAudio {
                path,
                duration_seconds: Some(95.0),
            })
        }
    }

    struct FixedSpeech(Result<String, &'static str>);

    #[async_trait]
    impl SpeechToText for FixedSpeech {
        async fn transcribe(&self, path: &Path) -> Result<String, ClientError> {
            assert!(path.exists(), "audio must exist while transcribing");
            self.0.clone().map_err(|e| ClientError::Unavailable(e.to_string()))
        }
    }

    fn settings() -> TranscriptSettings {
        TranscriptSettings {
            min_chars: 100,
            cookie_file: None,
        }
    }

    fn long_text() -> String {
        "the mitochondria is the powerhouse of the cell ".repeat(5)
    }

    fn no_captions() -> MockCaptionSource {
        let mut captions = MockCaptionSource::new();
        captions
            .expect_fetch_default()
            .returning(|_, _| Err(ClientError::NotFound("no captions".into())));
        captions
            .expect_list_tracks()
            .returning(|_| Err(ClientError::NotFound("no tracks".into())));
        captions
    }

    fn track(language: &str, is_manual: bool) -> CaptionTrack {
        CaptionTrack {
            language: language.into(),
            is_manual,
            url: format!("https://captions.test/{}", language),
        }
    }

    fn langs(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[actix_web::test]
    async fn exact_language_short_circuits() {
        let mut captions = MockCaptionSource::new();
        captions
            .expect_fetch_default()
            .withf(|video_id, language| video_id == "dQw4w9WgXcQ" && language == "fr")
            .times(1)
            .returning(|_, _| Ok(segments(20, 5.0)));
        captions.expect_list_tracks().never();

        let service = TranscriptService::new(
            Arc::new(captions),
            Arc::new(FailingDownloader),
            Arc::new(FixedSpeech(Err("unused"))),
            settings(),
        );

        let transcript = service
            .acquire("dQw4w9WgXcQ", &langs(&["fr", "en"]))
            .await
            .unwrap();
        assert_eq!(transcript.source, TranscriptSource::ExactLanguage);
        assert_eq!(transcript.total_seconds(), 100.0);
    }

    #[actix_web::test]
    async fn multi_language_prefers_manual_track() {
        let mut captions = MockCaptionSource::new();
        captions
            .expect_fetch_default()
            .returning(|_, _| Err(ClientError::NotFound("none".into())));
        captions.expect_list_tracks().returning(|_| {
            Ok(vec![track("en", false), track("ja", true), track("de", true)])
        });
        captions
            .expect_fetch_track()
            .withf(|t| t.language == "de" && t.is_manual)
            .times(1)
            .returning(|_| Ok(segments(20, 5.0)));

        let service = TranscriptService::new(
            Arc::new(captions),
            Arc::new(FailingDownloader),
            Arc::new(FixedSpeech(Err("unused"))),
            settings(),
        );

        let transcript = service.acquire("dQw4w9WgXcQ", &langs(&["en"])).await.unwrap();
        assert_eq!(transcript.source, TranscriptSource::MultiLanguage);
    }

    #[actix_web::test]
    async fn short_captions_fall_through_to_audio() {
        let mut captions = MockCaptionSource::new();
        captions
            .expect_fetch_default()
            .returning(|_, _| Ok(vec![TranscriptSegment::new("[Music]", 0.0, 3.0)]));
        captions
            .expect_list_tracks()
            .returning(|_| Ok(vec![track("zz", true)]));

        let dir = std::env::temp_dir();
        let downloader = Arc::new(FileDownloader {
            dir,
            created: Mutex::new(Vec::new()),
        });
        let service = TranscriptService::new(
            Arc::new(captions),
            downloader.clone(),
            Arc::new(FixedSpeech(Ok(long_text()))),
            settings(),
        );

        let transcript = service.acquire("dQw4w9WgXcQ", &langs(&["en"])).await.unwrap();
        assert_eq!(transcript.source, TranscriptSource::AudioTranscription);
        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.total_seconds(), 95.0);

        for path in downloader.created.lock().unwrap().iter() {
            assert!(!path.exists(), "{} was not removed", path.display());
        }
    }

    #[actix_web::test]
    async fn audio_file_is_removed_when_transcription_fails() {
        let downloader = Arc::new(FileDownloader {
            dir: std::env::temp_dir(),
            created: Mutex::new(Vec::new()),
        });
        let service = TranscriptService::new(
            Arc::new(no_captions()),
            downloader.clone(),
            Arc::new(FixedSpeech(Err("model crashed"))),
            settings(),
        );

        let err = service.acquire("dQw4w9WgXcQ", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::TranscriptUnavailable(TranscriptUnavailable::NotFound(_))
        ));

        let created = downloader.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert!(!created[0].exists());
    }

    #[actix_web::test]
    async fn short_transcription_is_reported_as_too_short() {
        let service = TranscriptService::new(
            Arc::new(no_captions()),
            Arc::new(FileDownloader {
                dir: std::env::temp_dir(),
                created: Mutex::new(Vec::new()),
            }),
            Arc::new(FixedSpeech(Ok("hi".into()))),
            settings(),
        );

        let err = service.acquire("dQw4w9WgXcQ", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::TranscriptUnavailable(TranscriptUnavailable::TooShort { chars: 2, min: 100 })
        ));
    }

    #[actix_web::test]
    async fn download_failure_is_not_found() {
        let service = TranscriptService::new(
            Arc::new(no_captions()),
            Arc::new(FailingDownloader),
            Arc::new(FixedSpeech(Ok(long_text()))),
            settings(),
        );

        let err = service.acquire("dQw4w9WgXcQ", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::TranscriptUnavailable(TranscriptUnavailable::NotFound(_))
        ));
    }

    #[test]
    fn rank_tracks_orders_by_manual_then_preference() {
        let tracks = vec![
            track("en", false),
            track("es", true),
            track("fr", true),
            track("en-GB", true),
            track("pt", true),
        ];

        let ranked: Vec<String> = rank_tracks(tracks, &langs(&["fr", "en-GB"]))
            .into_iter()
            .map(|t| t.language)
            .collect();
        assert_eq!(ranked, vec!["fr", "en-GB", "es", "en"]);
    }

    #[test]
    fn rank_tracks_prefers_exact_tag_over_primary_match() {
        let tracks = vec![track("en-US", true), track("en-GB", true), track("en", true)];
        let mut reversed = tracks.clone();
        reversed.reverse();

        for input in [tracks, reversed] {
            let ranked: Vec<String> = rank_tracks(input, &langs(&["en-GB", "en"]))
                .into_iter()
                .map(|t| t.language)
                .collect();
            assert_eq!(ranked, vec!["en-GB", "en", "en-US"]);
        }
    }

    #[test]
    fn preference_rank_uses_best_match_over_all_preferences() {
        let preferred = langs(&["en-GB", "en"]);
        assert_eq!(preference_rank("en-GB", &preferred), 0);
        assert_eq!(preference_rank("en", &preferred), 1);
        assert_eq!(preference_rank("en-US", &preferred), 2);
        assert_eq!(preference_rank("fr", &preferred), usize::MAX);
    }

    #[test]
    fn rank_tracks_falls_back_to_supported_order() {
        let tracks = vec![track("zh-Hans", false), track("hi", false), track("xx", true)];

        let ranked: Vec<String> = rank_tracks(tracks, &[])
            .into_iter()
            .map(|t| t.language)
            .collect();
        assert_eq!(ranked, vec!["hi", "zh-Hans"]);
    }
}
