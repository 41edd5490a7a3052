use std::{sync::Arc, time::Duration};

use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    clients::{preview, BackendError, GenerationBackend, Prompt},
    constants::prompts::{question_user_prompt, QUESTION_SYSTEM_PROMPT},
    models::domain::{Chunk, Difficulty, QuestionCandidate},
};

const PLACEHOLDER_QUESTION: &str = "According to this segment, what is the main idea discussed?";
const PLACEHOLDER_CHOICES: [&str; 4] = [
    "A tangential topic unrelated to the segment",
    "The primary concept explained by the speaker",
    "A future topic not yet covered",
    "A contradictory idea not mentioned",
];
const PLACEHOLDER_CORRECT_CHOICE: usize = 1;
const PLACEHOLDER_EXPLANATION: &str =
    "The speaker emphasizes this as the central idea in the excerpt.";

/// Bounded retry for transient backend failures. The delay before retry `n`
/// (zero based) is `base_delay + n * step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            step: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// Retries without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            step: Duration::ZERO,
        }
    }

    fn delay(&self, retry: u32) -> Duration {
        self.base_delay + self.step * retry
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub chunk: &'a Chunk,
    pub difficulty: Difficulty,
    pub count: usize,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("could not extract questions: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Model(Vec<QuestionCandidate>),
    Placeholder(Vec<QuestionCandidate>),
}

impl GenerationOutcome {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, GenerationOutcome::Placeholder(_))
    }

    pub fn into_candidates(self) -> Vec<QuestionCandidate> {
        match self {
            GenerationOutcome::Model(candidates) | GenerationOutcome::Placeholder(candidates) => {
                candidates
            }
        }
    }
}

pub struct QuestionGenerator {
    backend: Arc<dyn GenerationBackend>,
    retry: RetryPolicy,
}

impl QuestionGenerator {
    pub fn new(backend: Arc<dyn GenerationBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    pub fn build_prompt(request: &GenerationRequest<'_>) -> Prompt {
        Prompt {
            system: QUESTION_SYSTEM_PROMPT.to_string(),
            user: question_user_prompt(request.chunk, request.difficulty, request.count),
        }
    }

    /// Candidates for one chunk. Never fails: any backend or parse error
    /// yields placeholder questions for the requested difficulty and window.
    pub async fn generate(&self, request: &GenerationRequest<'_>) -> GenerationOutcome {
        match self.attempt(request).await {
            Ok(candidates) => GenerationOutcome::Model(candidates),
            Err(e) => {
                log::warn!(
                    "Question generation for {:.0}s-{:.0}s fell back to placeholders: {}",
                    request.chunk.start,
                    request.chunk.end,
                    e
                );
                GenerationOutcome::Placeholder(placeholder_candidates(request))
            }
        }
    }

    pub async fn attempt(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<Vec<QuestionCandidate>, GenerationError> {
        let prompt = Self::build_prompt(request);
        let text = self.complete_with_retry(&prompt).await?;
        extract_question_array(&text)
    }

    async fn complete_with_retry(&self, prompt: &Prompt) -> Result<String, BackendError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut retry = 0;

        loop {
            match self.backend.complete(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && retry + 1 < max_attempts => {
                    let delay = self.retry.delay(retry);
                    log::warn!(
                        "Generation attempt {}/{} failed, retrying in {:?}: {}",
                        retry + 1,
                        max_attempts,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

type ArrayStrategy = fn(&str) -> Option<Vec<Value>>;

const ARRAY_STRATEGIES: &[ArrayStrategy] = &[whole_array, questions_field, embedded_array];

/// Pulls the question objects out of a model response. Tries the whole text
/// as an array, then as an object with a `questions` array, then the first
/// bracketed array embedded in surrounding prose or code fences. Items that
/// are not objects are dropped.
pub fn extract_question_array(text: &str) -> Result<Vec<QuestionCandidate>, GenerationError> {
    let items = ARRAY_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(text))
        .ok_or_else(|| GenerationError::Parse(format!("no JSON array in: {}", preview(text, 200))))?;

    let candidates: Vec<QuestionCandidate> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    if candidates.is_empty() {
        return Err(GenerationError::Parse("array holds no question objects".to_string()));
    }
    Ok(candidates)
}

fn whole_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str(text.trim()) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn questions_field(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str(text.trim()) {
        Ok(Value::Object(mut map)) => match map.remove("questions") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

fn embedded_array(text: &str) -> Option<Vec<Value>> {
    let bytes = text.as_bytes();

    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'[')
        .filter_map(|(start, _)| {
            let end = balanced_array_end(bytes, start)?;
            match serde_json::from_str(&text[start..=end]) {
                Ok(Value::Array(items)) if items.iter().any(Value::is_object) => Some(items),
                _ => None,
            }
        })
        .next()
}

/// Index of the `]` closing the `[` at `start`, ignoring brackets inside
/// JSON strings.
fn balanced_array_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

/// Deterministic stand-in questions used when the backend cannot help.
pub fn placeholder_candidates(request: &GenerationRequest<'_>) -> Vec<QuestionCandidate> {
    let candidate = json!({
        "question_text": PLACEHOLDER_QUESTION,
        "choices": PLACEHOLDER_CHOICES,
        "correct_choice": PLACEHOLDER_CORRECT_CHOICE,
        "difficulty": request.difficulty,
        "time_start": request.chunk.start,
        "time_end": request.chunk.end,
        "short_explanation": PLACEHOLDER_EXPLANATION,
    });

    match candidate {
        Value::Object(map) => vec![map; request.count],
        _ => Vec::new(),
    }
}
