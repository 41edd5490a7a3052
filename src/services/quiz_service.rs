use std::sync::Arc;

use futures::{stream, StreamExt};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Chunk, Difficulty, DifficultyMix, Question, QuestionDefaults, Quiz},
    services::{
        chunker::chunk_segments,
        difficulty::build_schedule,
        metrics::{Metrics, DISCARDED_CANDIDATES, PLACEHOLDER_FALLBACKS},
        question_generator::{GenerationRequest, QuestionGenerator},
        transcript_service::TranscriptService,
        vector_service::TranscriptIndexer,
        video_id::extract_video_id,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct QuizOptions {
    pub num_questions: usize,
    pub mix: DifficultyMix,
    pub preferred_languages: Vec<String>,
    pub max_chunk_seconds: f64,
}

pub struct QuizService {
    transcripts: Arc<TranscriptService>,
    generator: QuestionGenerator,
    indexer: Option<Arc<TranscriptIndexer>>,
    metrics: Arc<Metrics>,
    concurrency: usize,
}

impl QuizService {
    pub fn new(
        transcripts: Arc<TranscriptService>,
        generator: QuestionGenerator,
        indexer: Option<Arc<TranscriptIndexer>>,
        metrics: Arc<Metrics>,
        concurrency: usize,
    ) -> Self {
        Self {
            transcripts,
            generator,
            indexer,
            metrics,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn generate_quiz(&self, video: &str, options: &QuizOptions) -> AppResult<Quiz> {
        let video_id = extract_video_id(video)?;
        let transcript = self
            .transcripts
            .acquire(&video_id, &options.preferred_languages)
            .await?;
        self.metrics.record_transcript_source(transcript.source);

        if let Some(indexer) = &self.indexer {
            indexer.spawn_index(&transcript);
        }

        let total_transcript_seconds = transcript.total_seconds();
        let chunks = chunk_segments(&transcript.segments, options.max_chunk_seconds);
        let schedule = build_schedule(options.num_questions, &options.mix);
        log::info!(
            "Generating {} questions for {} from {} chunks",
            schedule.len(),
            video_id,
            chunks.len()
        );

        let questions = self.assemble(&chunks, &schedule).await;
        if questions.is_empty() {
            return Err(AppError::GenerationFailed(format!(
                "no valid questions survived for {}",
                video_id
            )));
        }

        Ok(Quiz {
            video_id,
            total_transcript_seconds,
            questions,
        })
    }

    /// Runs the schedule against the chunks, position `i` using chunk
    /// `i % chunks.len()`. Calls overlap up to the configured concurrency but
    /// the output keeps schedule order. Invalid candidates are dropped.
    pub async fn assemble(&self, chunks: &[Chunk], schedule: &[Difficulty]) -> Vec<Question> {
        if chunks.is_empty() {
            return Vec::new();
        }

        let outcomes: Vec<_> = stream::iter(schedule.iter().enumerate())
            .map(|(i, &difficulty)| {
                let chunk = &chunks[i % chunks.len()];
                async move {
                    let request = GenerationRequest {
                        chunk,
                        difficulty,
                        count: 1,
                    };
                    (difficulty, chunk, self.generator.generate(&request).await)
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut questions = Vec::with_capacity(schedule.len());
        for (difficulty, chunk, outcome) in outcomes {
            if outcome.is_placeholder() {
                self.metrics.increment(PLACEHOLDER_FALLBACKS);
            }

            let defaults = QuestionDefaults::for_chunk(difficulty, chunk);
            for candidate in outcome.into_candidates() {
                match Question::from_candidate(&candidate, &defaults) {
                    Ok(question) => questions.push(question),
                    Err(e) => {
                        self.metrics.increment(DISCARDED_CANDIDATES);
                        log::debug!("Discarded question candidate: {}", e);
                    }
                }
            }
        }

        questions
    }
}
