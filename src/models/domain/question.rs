use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::domain::{Chunk, Difficulty};

pub const CHOICE_COUNT: usize = 4;

/// Raw question object returned by the generation backend, before validation.
pub type QuestionCandidate = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub choices: Vec<String>,
    pub correct_choice: usize,
    pub difficulty: Difficulty,
    pub time_start: f64,
    pub time_end: f64,
    #[serde(rename = "short_explanation")]
    pub explanation: String,
}

/// Values used when a candidate omits its difficulty or time window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuestionDefaults {
    pub difficulty: Difficulty,
    pub time_start: f64,
    pub time_end: f64,
}

impl QuestionDefaults {
    pub fn for_chunk(difficulty: Difficulty, chunk: &Chunk) -> Self {
        Self {
            difficulty,
            time_start: chunk.start,
            time_end: chunk.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandidateError {
    #[error("missing or empty question text")]
    MissingText,

    #[error("expected 4 choices, found {0}")]
    ChoiceCount(usize),

    #[error("choice {0} is not a non-empty string")]
    InvalidChoice(usize),

    #[error("correct_choice is missing or not an integer")]
    MissingCorrectChoice,

    #[error("correct_choice {0} is outside 0..4")]
    CorrectChoiceOutOfRange(i64),

    #[error("unknown difficulty '{0}'")]
    UnknownDifficulty(String),

    #[error("time window {0}..{1} ends before it starts")]
    InvertedWindow(f64, f64),
}

impl Question {
    /// Validates a raw candidate. Accepts the keys of the generation contract
    /// (`question_text`, `short_explanation`) and their short forms.
    pub fn from_candidate(
        candidate: &QuestionCandidate,
        defaults: &QuestionDefaults,
    ) -> Result<Self, CandidateError> {
        let text = first_str(candidate, &["question_text", "question", "text"])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(CandidateError::MissingText)?
            .to_string();

        let raw_choices = candidate
            .get("choices")
            .or_else(|| candidate.get("options"))
            .and_then(Value::as_array)
            .ok_or(CandidateError::ChoiceCount(0))?;
        if raw_choices.len() != CHOICE_COUNT {
            return Err(CandidateError::ChoiceCount(raw_choices.len()));
        }
        let choices = raw_choices
            .iter()
            .enumerate()
            .map(|(i, choice)| {
                choice
                    .as_str()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .ok_or(CandidateError::InvalidChoice(i))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let index = candidate
            .get("correct_choice")
            .and_then(as_integer)
            .ok_or(CandidateError::MissingCorrectChoice)?;
        if index < 0 || index >= CHOICE_COUNT as i64 {
            return Err(CandidateError::CorrectChoiceOutOfRange(index));
        }

        let difficulty = match candidate.get("difficulty") {
            None | Some(Value::Null) => defaults.difficulty,
            Some(value) => {
                let label = value.as_str().unwrap_or_default();
                Difficulty::parse(label)
                    .ok_or_else(|| CandidateError::UnknownDifficulty(value.to_string()))?
            }
        };

        let time_start = candidate
            .get("time_start")
            .and_then(Value::as_f64)
            .unwrap_or(defaults.time_start);
        let time_end = candidate
            .get("time_end")
            .and_then(Value::as_f64)
            .unwrap_or(defaults.time_end);
        if time_start > time_end {
            return Err(CandidateError::InvertedWindow(time_start, time_end));
        }

        let explanation = first_str(candidate, &["short_explanation", "explanation"])
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Question {
            text,
            choices,
            correct_choice: index as usize,
            difficulty,
            time_start,
            time_end,
            explanation,
        })
    }
}

fn first_str<'a>(candidate: &'a QuestionCandidate, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| candidate.get(*key).and_then(Value::as_str))
}

// Models sometimes answer `1.0` or `"1"` for an index.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
