use crate::models::domain::{transcript::join_segment_text, Chunk, TranscriptSegment};

/// Merges consecutive segments into windows of at least `max_chunk_seconds`.
/// The boundary is checked after a segment is included, so a chunk can run
/// past the maximum by its last segment. The trailing window is always kept.
pub fn chunk_segments(segments: &[TranscriptSegment], max_chunk_seconds: f64) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut window_start = 0;

    for (i, segment) in segments.iter().enumerate() {
        let start = segments[window_start].start;
        if segment.end() - start >= max_chunk_seconds {
            chunks.push(build_chunk(&segments[window_start..=i]));
            window_start = i + 1;
        }
    }

    if window_start < segments.len() {
        chunks.push(build_chunk(&segments[window_start..]));
    }

    chunks
}

fn build_chunk(window: &[TranscriptSegment]) -> Chunk {
    let start = window.first().map(|s| s.start).unwrap_or(0.0);
    let end = window.last().map(TranscriptSegment::end).unwrap_or(start);
    Chunk {
        text: join_segment_text(window),
        start,
        end: end.max(start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::segments;

    #[test]
    fn flushes_once_window_reaches_maximum() {
        let input = vec![
            TranscriptSegment::new("a", 0.0, 100.0),
            TranscriptSegment::new("b", 100.0, 100.0),
        ];

        let chunks = chunk_segments(&input, 150.0);
        assert_eq!(
            chunks,
            vec![Chunk {
                text: "a b".into(),
                start: 0.0,
                end: 200.0
            }]
        );
    }

    #[test]
    fn trailing_window_is_flushed() {
        let chunks = chunk_segments(&segments(7, 30.0), 60.0);

        let bounds: Vec<(f64, f64)> = chunks.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(
            bounds,
            vec![(0.0, 60.0), (60.0, 120.0), (120.0, 180.0), (180.0, 210.0)]
        );
    }

    #[test]
    fn overlong_segment_is_its_own_chunk() {
        let input = vec![
            TranscriptSegment::new("short", 0.0, 10.0),
            TranscriptSegment::new("very long", 10.0, 500.0),
            TranscriptSegment::new("after", 510.0, 5.0),
        ];

        let chunks = chunk_segments(&input, 60.0);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "short very long");
        assert_eq!(chunks[1].text, "after");
    }

    #[test]
    fn chunks_are_ordered_and_preserve_text() {
        let input = segments(25, 13.0);
        let chunks = chunk_segments(&input, 60.0);

        for pair in chunks.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        let joined: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined.join(" "), join_segment_text(&input));
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_segments(&[], 60.0).is_empty());
    }
}
