//! Fixed-size sliding window chunker.
//!
//! Windows are `chunk_size` characters wide and start every
//! `chunk_size - overlap` characters. Generation stops with the first window
//! that reaches the end of the text; any later window would lie entirely
//! inside it. Only that last window can be shorter than `chunk_size`, and it
//! is dropped when shorter than the effective minimum length.

use super::{Chunk, ChunkingConfig};
use crate::error::Result;
use tracing::debug;

/// Split text into overlapping windows, in document order.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    config.validate()?;

    // Byte offset of every character plus the end of the string, so windows
    // are sliced on character boundaries.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = offsets.len() - 1;

    let stride = config.stride();
    let min_chars = config.effective_min_chars();

    let mut chunks = Vec::with_capacity(char_len / stride + 1);
    let mut start = 0;
    while start < char_len {
        let end = (start + config.chunk_size).min(char_len);
        if end - start >= min_chars {
            chunks.push(text[offsets[start]..offsets[end]].to_string());
        } else {
            debug!("Dropping {}-character trailing window", end - start);
        }
        if end == char_len {
            break;
        }
        start += stride;
    }

    Ok(chunks)
}

/// Split a document's text into ordered [`Chunk`]s.
pub fn chunk_document(doc_id: &str, text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    let chunks = chunk_text(text, config)?
        .into_iter()
        .enumerate()
        .map(|(ordinal, text)| Chunk::new(text, doc_id, ordinal))
        .collect::<Vec<_>>();

    debug!("Chunked {} into {} chunks", doc_id, chunks.len());
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, overlap: usize, min: usize) -> ChunkingConfig {
        ChunkingConfig::new(chunk_size, overlap).with_min_chunk_chars(min)
    }

    #[test]
    fn test_a_then_b_document() {
        let text = format!("{}{}", "A".repeat(300), "B".repeat(300));
        let chunks = chunk_document("notes", &text, &ChunkingConfig::new(200, 50)).unwrap();

        assert_eq!(chunks.len(), 4);
        let ordinals: Vec<usize> = chunks.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
        assert_eq!(chunks[0].text, text[0..200]);
        assert_eq!(chunks[1].text, text[150..350]);
        assert_eq!(chunks[3].text, "B".repeat(150));
        assert!(chunks.iter().all(|c| c.source_doc_id == "notes"));
    }

    #[test]
    fn test_no_overlap_gives_blocks() {
        let chunks = chunk_text("0123456789abcdefghij", &config(10, 0, 0)).unwrap();
        assert_eq!(chunks, vec!["0123456789", "abcdefghij"]);
    }

    #[test]
    fn test_overlap() {
        let chunks = chunk_text("0123456789abcdefghij", &config(10, 5, 0)).unwrap();
        // The window at 10 reaches the end; a window at 15 would add nothing.
        assert_eq!(chunks, vec!["0123456789", "56789abcde", "abcdefghij"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", &ChunkingConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_short_text_single_or_dropped() {
        // Shorter than the window but above the minimum: one chunk.
        let text = "x".repeat(300);
        let chunks = chunk_text(&text, &ChunkingConfig::default()).unwrap();
        assert_eq!(chunks, vec![text]);

        // Below the minimum: dropped entirely.
        let chunks = chunk_text(&"x".repeat(150), &ChunkingConfig::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_trailing_window_is_dropped() {
        // Stride 900, minimum 300: the window at 900 is 250 chars long.
        let cfg = config(1000, 100, 300);
        let chunks = chunk_text(&"y".repeat(1150), &cfg).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 1000);

        // 350 chars clears the minimum.
        let chunks = chunk_text(&"y".repeat(1250), &cfg).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].len(), 350);
    }

    #[test]
    fn test_count_matches_window_formula() {
        for (len, size, overlap) in [(600, 200, 50), (610, 200, 50), (1000, 100, 0), (999, 100, 90), (57, 10, 3)] {
            let text = "z".repeat(len);
            let chunks = chunk_text(&text, &config(size, overlap, 0)).unwrap();
            let expected = (len - overlap).div_ceil(size - overlap);
            assert_eq!(chunks.len(), expected, "len={} size={} overlap={}", len, size, overlap);
        }
    }

    #[test]
    fn test_windows_cover_text_without_gaps() {
        let text: String = (0..733).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let cfg = config(120, 30, 0);
        let chunks = chunk_text(&text, &cfg).unwrap();

        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let start = i * cfg.stride();
            assert_eq!(&text[start..start + chunk.len()], chunk.as_str());
            // Append only what the previous window did not already cover.
            let covered = rebuilt.len() - start;
            rebuilt.push_str(&chunk[covered..]);
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_deterministic() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let cfg = config(100, 20, 10);
        assert_eq!(chunk_text(&text, &cfg).unwrap(), chunk_text(&text, &cfg).unwrap());
    }

    #[test]
    fn test_unicode_safety() {
        let text = "héllo wörld 👋 ".repeat(20);
        let chunks = chunk_text(&text, &config(7, 2, 0)).unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.chars().count() <= 7));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(chunk_text("abc", &config(10, 10, 0)).is_err());
    }
}
