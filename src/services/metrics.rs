use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use crate::models::domain::TranscriptSource;

pub const GENERATE_QUIZ_REQUESTS: &str = "generate_quiz_requests_total";
pub const TRANSCRIPT_REQUESTS: &str = "transcript_requests_total";
pub const PLACEHOLDER_FALLBACKS: &str = "placeholder_fallbacks_total";
pub const DISCARDED_CANDIDATES: &str = "discarded_candidates_total";

/// Process-wide request counters exported at `/metrics`.
#[derive(Debug, Default)]
pub struct Metrics {
    counters: Mutex<BTreeMap<&'static str, u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, name: &'static str) {
        self.add(name, 1);
    }

    pub fn add(&self, name: &'static str, value: u64) {
        *self.lock().entry(name).or_insert(0) += value;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.lock().get(name).copied().unwrap_or(0)
    }

    pub fn record_transcript_source(&self, source: TranscriptSource) {
        let name = match source {
            TranscriptSource::ExactLanguage => "transcript_tier_exact_total",
            TranscriptSource::MultiLanguage => "transcript_tier_multi_language_total",
            TranscriptSource::AudioTranscription => "transcript_tier_audio_total",
        };
        self.increment(name);
    }

    pub fn export(&self) -> BTreeMap<&'static str, u64> {
        self.lock().clone()
    }

    // A panic while holding the lock cannot leave a counter half-written.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<&'static str, u64>> {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_accumulate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.get(GENERATE_QUIZ_REQUESTS), 0);

        metrics.increment(GENERATE_QUIZ_REQUESTS);
        metrics.add(DISCARDED_CANDIDATES, 3);
        metrics.increment(GENERATE_QUIZ_REQUESTS);

        assert_eq!(metrics.get(GENERATE_QUIZ_REQUESTS), 2);
        assert_eq!(metrics.get(DISCARDED_CANDIDATES), 3);
    }

    #[test]
    fn transcript_sources_have_their_own_counters() {
        let metrics = Metrics::new();
        metrics.record_transcript_source(TranscriptSource::AudioTranscription);
        metrics.record_transcript_source(TranscriptSource::ExactLanguage);
        metrics.record_transcript_source(TranscriptSource::AudioTranscription);

        let exported = metrics.export();
        assert_eq!(exported["transcript_tier_audio_total"], 2);
        assert_eq!(exported["transcript_tier_exact_total"], 1);
        assert!(!exported.contains_key("transcript_tier_multi_language_total"));
    }
}
