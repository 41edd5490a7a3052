use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::{
    models::domain::{Difficulty, DifficultyMix},
    services::quiz_service::QuizOptions,
};

pub const DEFAULT_MIX: DifficultyMix = DifficultyMix::new(2, 3, 1);
pub const DEFAULT_LANGUAGES: [&str; 3] = ["en", "en-GB", "en-US"];
pub const DEFAULT_MAX_CHUNK_SECONDS: u32 = 180;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[serde(alias = "url", alias = "youtube_url")]
    #[validate(length(min = 1, max = 2048))]
    pub video_url: String,

    #[validate(range(min = 1, max = 50))]
    pub num_questions: Option<usize>,

    #[validate(nested)]
    pub difficulty_mix: Option<DifficultyMix>,

    /// Shorthand for a mix with every question at one difficulty.
    pub difficulty: Option<Difficulty>,

    #[validate(length(max = 10), custom(function = "validate_languages"))]
    pub preferred_languages: Option<Vec<String>>,

    #[validate(range(min = 60, max = 600))]
    pub max_chunk_seconds: Option<u32>,
}

impl GenerateQuizRequest {
    pub fn into_options(self, default_questions: usize) -> QuizOptions {
        let mix = match (self.difficulty_mix, self.difficulty) {
            (Some(mix), _) => mix,
            (None, Some(difficulty)) => DifficultyMix::only(difficulty),
            (None, None) => DEFAULT_MIX,
        };

        let preferred_languages = match self.preferred_languages {
            Some(languages) if !languages.is_empty() => languages
                .into_iter()
                .map(|l| l.trim().to_string())
                .collect(),
            _ => DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
        };

        QuizOptions {
            num_questions: self.num_questions.unwrap_or(default_questions),
            mix,
            preferred_languages,
            max_chunk_seconds: f64::from(self.max_chunk_seconds.unwrap_or(DEFAULT_MAX_CHUNK_SECONDS)),
        }
    }
}

fn validate_languages(languages: &[String]) -> Result<(), ValidationError> {
    let valid = languages.iter().all(|language| {
        let language = language.trim();
        !language.is_empty()
            && language.len() <= 16
            && language
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    });

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_language_tag"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptQuery {
    /// Comma separated language preference, e.g. `fr,en`.
    pub lang: Option<String>,
}

impl TranscriptQuery {
    pub fn preferred_languages(&self) -> Vec<String> {
        let languages: Vec<String> = self
            .lang
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        if languages.is_empty() {
            DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect()
        } else {
            languages
        }
    }
}
