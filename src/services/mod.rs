pub mod chunker;
pub mod difficulty;
pub mod metrics;
pub mod question_generator;
pub mod quiz_service;
pub mod transcript_service;
pub mod vector_service;
pub mod video_id;
