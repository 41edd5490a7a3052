use serde::Serialize;

use crate::models::domain::Question;

/// Assembled result of one generation request. Never stored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quiz {
    pub video_id: String,
    pub total_transcript_seconds: f64,
    pub questions: Vec<Question>,
}
