use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::domain::Transcript;

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResponse {
    pub video_id: String,
    pub transcript: String,
}

impl From<Transcript> for TranscriptResponse {
    fn from(transcript: Transcript) -> Self {
        TranscriptResponse {
            transcript: transcript.text(),
            video_id: transcript.video_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}
