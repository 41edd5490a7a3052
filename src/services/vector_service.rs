use std::sync::Arc;

use serde_json::json;

use crate::{
    clients::{ClientError, EmbeddingBackend, VectorRecord, VectorStore},
    models::domain::Transcript,
};

const WINDOW_CHARS: usize = 1000;
const WINDOW_STEP: usize = 800;

/// Write-only side channel that stores transcript embeddings. Failures are
/// logged and never reach the quiz pipeline.
pub struct TranscriptIndexer {
    embeddings: Arc<dyn EmbeddingBackend>,
    store: Arc<dyn VectorStore>,
}

impl TranscriptIndexer {
    pub fn new(embeddings: Arc<dyn EmbeddingBackend>, store: Arc<dyn VectorStore>) -> Self {
        Self { embeddings, store }
    }

    /// Indexes in the background.
    pub fn spawn_index(self: &Arc<Self>, transcript: &Transcript) {
        let indexer = Arc::clone(self);
        let video_id = transcript.video_id.clone();
        let text = transcript.text();

        tokio::spawn(async move {
            match indexer.index(&video_id, &text).await {
                Ok(0) => log::debug!("No transcript windows stored for {}", video_id),
                Ok(stored) => log::info!("Stored {} transcript windows for {}", stored, video_id),
                Err(e) => log::warn!("Vector storage failed for {}: {}", video_id, e),
            }
        });
    }

    /// Embeds overlapping windows of `text` and upserts them. Windows whose
    /// embedding fails are skipped. Returns the number of stored records.
    pub async fn index(&self, video_id: &str, text: &str) -> Result<usize, ClientError> {
        let mut records = Vec::new();

        for (n, window) in window_text(text, WINDOW_CHARS, WINDOW_STEP).into_iter().enumerate() {
            match self.embeddings.embed(&window).await {
                Ok(values) if !values.is_empty() => records.push(VectorRecord {
                    id: format!("{}_{}", video_id, n),
                    values,
                    metadata: json!({ "text": window, "video_id": video_id }),
                }),
                Ok(_) => {}
                Err(e) => log::warn!("Embedding window {} of {} failed: {}", n, video_id, e),
            }
        }

        if records.is_empty() {
            return Ok(0);
        }
        let stored = records.len();
        self.store.upsert(records).await?;
        Ok(stored)
    }
}

/// Overlapping character windows of `size` starting every `step` characters.
pub(crate) fn window_text(text: &str, size: usize, step: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = step.max(1);

    (0..chars.len())
        .step_by(step)
        .map(|start| chars[start..(start + size).min(chars.len())].iter().collect())
        .collect()
}
