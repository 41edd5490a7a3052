use serde::{Deserialize, Serialize};

/// One timed line of captions or recognized speech. Times are in seconds.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start: start.max(0.0),
            duration: duration.max(0.0),
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Contiguous span of transcript text used as context for one generation call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Chunk {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl Chunk {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A caption track advertised for a video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language: String,
    pub is_manual: bool,
    pub url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptSource {
    ExactLanguage,
    MultiLanguage,
    AudioTranscription,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transcript {
    pub video_id: String,
    pub segments: Vec<TranscriptSegment>,
    pub source: TranscriptSource,
}

impl Transcript {
    pub fn new(video_id: &str, segments: Vec<TranscriptSegment>, source: TranscriptSource) -> Self {
        Self {
            video_id: video_id.to_string(),
            segments,
            source,
        }
    }

    pub fn text(&self) -> String {
        join_segment_text(&self.segments)
    }

    /// End of the last segment, or zero for an empty transcript.
    pub fn total_seconds(&self) -> f64 {
        self.segments.last().map(TranscriptSegment::end).unwrap_or(0.0)
    }
}

/// Joins segment texts in order with single spaces, skipping blank lines.
pub fn join_segment_text<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = &'a TranscriptSegment>,
{
    segments
        .into_iter()
        .map(|segment| segment.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_clamps_negative_times() {
        let segment = TranscriptSegment::new("hi", -3.0, -1.0);
        assert_eq!(segment.start, 0.0);
        assert_eq!(segment.duration, 0.0);
    }

    #[test]
    fn transcript_total_seconds_uses_last_segment() {
        let transcript = Transcript::new(
            "dQw4w9WgXcQ",
            vec![
                TranscriptSegment::new("one", 0.0, 4.0),
                TranscriptSegment::new("two", 4.0, 2.5),
            ],
            TranscriptSource::ExactLanguage,
        );

        assert_eq!(transcript.total_seconds(), 6.5);
        assert_eq!(transcript.text(), "one two");
    }

    #[test]
    fn empty_transcript_has_zero_duration() {
        let transcript = Transcript::new("dQw4w9WgXcQ", vec![], TranscriptSource::MultiLanguage);
        assert_eq!(transcript.total_seconds(), 0.0);
        assert!(transcript.text().is_empty());
    }

    #[test]
    fn join_skips_blank_segments() {
        let segments = vec![
            TranscriptSegment::new("  hello ", 0.0, 1.0),
            TranscriptSegment::new("\n", 1.0, 1.0),
            TranscriptSegment::new("world", 2.0, 1.0),
        ];
        assert_eq!(join_segment_text(&segments), "hello world");
    }
}
