use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{AppError, AppResult};

const ID_LENGTH: usize = 11;

// Each pattern requires a boundary after the 11 characters so that longer
// tokens are not truncated into a plausible-looking ID.
static ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"[?&]v=([0-9A-Za-z_-]{11})(?:[^0-9A-Za-z_-]|$)",
        r"/([0-9A-Za-z_-]{11})(?:[?#&/]|$)",
        r"embed/([0-9A-Za-z_-]{11})(?:[^0-9A-Za-z_-]|$)",
        r"^([0-9A-Za-z_-]{11})$",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Extracts the 11-character video ID from a watch URL, short link, embed URL
/// or a bare ID.
pub fn extract_video_id(input: &str) -> AppResult<String> {
    let input = input.trim();

    ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(input))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .filter(|id| is_valid_id(id))
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidIdentifier(input.chars().take(100).collect()))
}

fn is_valid_id(candidate: &str) -> bool {
    candidate.len() == ID_LENGTH
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
