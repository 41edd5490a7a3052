#[cfg(test)]
pub mod fixtures {
    use serde_json::json;

    use crate::models::domain::{Chunk, QuestionCandidate, TranscriptSegment};

    /// A complete candidate as the generation contract describes it.
    pub fn candidate(text: &str, correct: i64, difficulty: &str) -> QuestionCandidate {
        let value = json!({
            "question_text": text,
            "choices": ["first", "second", "third", "fourth"],
            "correct_choice": correct,
            "difficulty": difficulty,
            "time_start": 0.0,
            "time_end": 30.0,
            "short_explanation": "Stated in the excerpt."
        });
        value.as_object().cloned().unwrap_or_default()
    }

    /// A model-style question object without a time window.
    pub fn candidate_json(text: &str, correct: i64, difficulty: &str) -> String {
        json!({
            "question_text": text,
            "choices": ["first", "second", "third", "fourth"],
            "correct_choice": correct,
            "difficulty": difficulty,
            "short_explanation": "Stated in the excerpt."
        })
        .to_string()
    }

    /// `count` back-to-back segments of `duration` seconds starting at zero.
    pub fn segments(count: usize, duration: f64) -> Vec<TranscriptSegment> {
        (0..count)
            .map(|i| {
                TranscriptSegment::new(
                    format!("segment {} of the lecture", i),
                    i as f64 * duration,
                    duration,
                )
            })
            .collect()
    }

    pub fn chunk(text: &str, start: f64, end: f64) -> Chunk {
        Chunk {
            text: text.to_string(),
            start,
            end,
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_segments_are_contiguous() {
        let segments = segments(3, 10.0);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].start, 10.0);
        assert_eq!(segments[2].end(), 30.0);
    }

    #[test]
    fn test_fixtures_candidate_has_contract_keys() {
        let candidate = candidate("Q?", 1, "easy");
        for key in ["question_text", "choices", "correct_choice", "short_explanation"] {
            assert!(candidate.contains_key(key), "missing {}", key);
        }
    }
}
