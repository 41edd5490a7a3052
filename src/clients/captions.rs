use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::{
    clients::{preview, watch_url, ClientError},
    models::domain::{CaptionTrack, TranscriptSegment},
};

const TIMEDTEXT_URL: &str = "https://www.youtube.com/api/timedtext";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Captions in exactly `language`.
    async fn fetch_default(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Vec<TranscriptSegment>, ClientError>;

    /// Every caption track the video advertises, manual and auto-generated.
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, ClientError>;

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<TranscriptSegment>, ClientError>;
}

/// Reads captions from YouTube's `timedtext` endpoint and discovers tracks
/// through `yt-dlp --dump-json`.
pub struct YouTubeCaptionClient {
    http: reqwest::Client,
    ytdlp_path: String,
    timeout: Duration,
}

impl YouTubeCaptionClient {
    pub fn new(http: reqwest::Client, ytdlp_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            ytdlp_path: ytdlp_path.into(),
            timeout,
        }
    }

    async fn fetch_json3(&self, request: reqwest::RequestBuilder) -> Result<Vec<TranscriptSegment>, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::NotFound(format!("caption request returned {}", status)));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ClientError::NotFound("caption track is empty".to_string()));
        }

        let json: Value = serde_json::from_str(&body)
            .map_err(|e| ClientError::Parse(format!("{}: {}", e, preview(&body, 200))))?;
        let segments = parse_json3(&json);
        if segments.is_empty() {
            return Err(ClientError::NotFound("caption track has no text".to_string()));
        }
        Ok(segments)
    }

    async fn dump_video_json(&self, video_id: &str) -> Result<Value, ClientError> {
        let mut command = Command::new(&self.ytdlp_path);
        command
            .args(["--dump-json", "--skip-download", "--no-warnings", "--no-playlist"])
            .arg(watch_url(video_id))
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::Unavailable(preview(stderr.trim(), 300)));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| ClientError::Parse(e.to_string()))
    }
}

#[async_trait]
impl CaptionSource for YouTubeCaptionClient {
    async fn fetch_default(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Vec<TranscriptSegment>, ClientError> {
        let request = self
            .http
            .get(TIMEDTEXT_URL)
            .query(&[("v", video_id), ("lang", language), ("fmt", "json3")]);
        self.fetch_json3(request).await
    }

    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, ClientError> {
        let info = self.dump_video_json(video_id).await?;
        let tracks = tracks_from_video_info(&info);
        if tracks.is_empty() {
            return Err(ClientError::NotFound(format!("no caption tracks for {}", video_id)));
        }
        Ok(tracks)
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<TranscriptSegment>, ClientError> {
        self.fetch_json3(self.http.get(&track.url)).await
    }
}

/// Converts a json3 caption document into segments. Events without text
/// (window definitions, line breaks) are skipped.
pub(crate) fn parse_json3(document: &Value) -> Vec<TranscriptSegment> {
    let Some(events) = document["events"].as_array() else {
        return Vec::new();
    };

    events
        .iter()
        .filter_map(|event| {
            let segs = event["segs"].as_array()?;
            let text = segs
                .iter()
                .filter_map(|seg| seg["utf8"].as_str())
                .collect::<String>()
                .replace('\n', " ");
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            let start = event["tStartMs"].as_f64().unwrap_or(0.0) / 1000.0;
            let duration = event["dDurationMs"].as_f64().unwrap_or(0.0) / 1000.0;
            Some(TranscriptSegment::new(text, start, duration))
        })
        .collect()
}

/// Tracks from yt-dlp video info: `subtitles` are manual, `automatic_captions`
/// are auto-generated. Only json3 renditions are kept.
pub(crate) fn tracks_from_video_info(info: &Value) -> Vec<CaptionTrack> {
    let mut tracks = Vec::new();

    for (key, is_manual) in [("subtitles", true), ("automatic_captions", false)] {
        let Some(by_language) = info[key].as_object() else {
            continue;
        };
        for (language, formats) in by_language {
            if language == "live_chat" {
                continue;
            }
            let url = formats.as_array().and_then(|formats| {
                formats
                    .iter()
                    .find(|f| f["ext"].as_str() == Some("json3"))
                    .and_then(|f| f["url"].as_str())
            });
            if let Some(url) = url {
                tracks.push(CaptionTrack {
                    language: language.clone(),
                    is_manual,
                    url: url.to_string(),
                });
            }
        }
    }

    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_json3_builds_segments_in_seconds() {
        let document = json!({
            "events": [
                { "tStartMs": 0, "dDurationMs": 5000, "id": 1 },
                { "tStartMs": 1200, "dDurationMs": 2500, "segs": [{ "utf8": "hello " }, { "utf8": "there" }] },
                { "tStartMs": 3700, "dDurationMs": 100, "segs": [{ "utf8": "\n" }] },
                { "tStartMs": 4000, "dDurationMs": 1000, "segs": [{ "utf8": "general\nkenobi" }] }
            ]
        });

        let segments = parse_json3(&document);
        assert_eq!(
            segments,
            vec![
                TranscriptSegment::new("hello there", 1.2, 2.5),
                TranscriptSegment::new("general kenobi", 4.0, 1.0),
            ]
        );
    }

    #[test]
    fn parse_json3_without_events_is_empty() {
        assert!(parse_json3(&json!({ "wireMagic": "pb3" })).is_empty());
    }

    #[test]
    fn tracks_from_video_info_marks_manual_and_auto() {
        let info = json!({
            "subtitles": {
                "fr": [{ "ext": "vtt", "url": "https://x/fr.vtt" }, { "ext": "json3", "url": "https://x/fr.json3" }],
                "live_chat": [{ "ext": "json3", "url": "https://x/chat" }]
            },
            "automatic_captions": {
                "en": [{ "ext": "json3", "url": "https://x/en.json3" }],
                "de": [{ "ext": "srv1", "url": "https://x/de.srv1" }]
            }
        });

        let tracks = tracks_from_video_info(&info);
        assert_eq!(
            tracks,
            vec![
                CaptionTrack {
                    language: "fr".into(),
                    is_manual: true,
                    url: "https://x/fr.json3".into()
                },
                CaptionTrack {
                    language: "en".into(),
                    is_manual: false,
                    url: "https://x/en.json3".into()
                },
            ]
        );
    }
}
