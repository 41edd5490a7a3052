use crate::models::domain::{Chunk, Difficulty};

pub const QUESTION_SYSTEM_PROMPT: &str = "You are an instructional design assistant. Given an excerpt of a lecture transcript and its time range (in seconds), generate multiple-choice questions across recall, application, and analysis.

Each question must include:
- question_text
- choices (exactly 4 strings)
- correct_choice (integer index 0-3)
- difficulty (easy|medium|hard)
- time_start, time_end (numbers)
- short_explanation (1-2 sentences)

Use only information present in or entailed by the excerpt. Avoid trivial wording duplicates.
Return a strict JSON array of question objects, with no extra commentary.";

pub fn question_user_prompt(chunk: &Chunk, difficulty: Difficulty, count: usize) -> String {
    format!(
        "Transcript time range: {:.2} to {:.2} (seconds)
Target difficulty: {}
Number of questions to create: {}

Transcript:
---
{}
---

Return ONLY a JSON array of question objects.",
        chunk.start,
        chunk.end,
        difficulty,
        count,
        chunk.text.trim()
    )
}
