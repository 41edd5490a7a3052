pub mod difficulty;
pub mod question;
pub mod quiz;
pub mod transcript;

pub use difficulty::{Difficulty, DifficultyMix};
pub use question::{Question, QuestionCandidate, QuestionDefaults};
pub use quiz::Quiz;
pub use transcript::{CaptionTrack, Chunk, Transcript, TranscriptSegment, TranscriptSource};
