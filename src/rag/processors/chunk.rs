// Fixed-size sliding window chunking over whitespace-separated words

use super::text::normalization::clean_text;
use crate::rag::{RAGError, RAGResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingOptions {
    /// Words per chunk
    pub chunk_size: usize,
    /// Words shared between consecutive chunks
    pub overlap: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            overlap: 50,
        }
    }
}

impl ChunkingOptions {
    pub fn new(chunk_size: usize, overlap: usize) -> RAGResult<Self> {
        let options = Self {
            chunk_size,
            overlap,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> RAGResult<()> {
        if self.chunk_size == 0 {
            return Err(RAGError::Chunking(
                "Chunk size must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(RAGError::Chunking(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Clean `text` and split it into overlapping windows of words.
///
/// Each chunk holds up to `chunk_size` words joined by single spaces; the
/// window advances by `chunk_size - overlap` words and stops once a window
/// reaches the last word.
pub fn chunker(text: &str, options: &ChunkingOptions) -> RAGResult<Vec<String>> {
    options.validate()?;

    let cleaned = clean_text(text);
    let words: Vec<&str> = cleaned.split_whitespace().collect();

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + options.chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));

        if end >= words.len() {
            break;
        }
        start += options.stride();
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_window_and_overlap() {
        let options = ChunkingOptions::new(4, 1).unwrap();
        let chunks = chunker(&words(10), &options).unwrap();

        assert_eq!(
            chunks,
            vec![
                "w0 w1 w2 w3".to_string(),
                "w3 w4 w5 w6".to_string(),
                "w6 w7 w8 w9".to_string(),
            ]
        );
    }

    #[test]
    fn test_last_window_may_be_short() {
        let options = ChunkingOptions::new(4, 2).unwrap();
        let chunks = chunker(&words(7), &options).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], "w4 w5 w6");
    }

    #[test]
    fn test_text_shorter_than_window() {
        let options = ChunkingOptions::new(50, 10).unwrap();
        let chunks = chunker("just a few words", &options).unwrap();
        assert_eq!(chunks, vec!["just a few words".to_string()]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let chunks = chunker("  \n\u{a0} ", &ChunkingOptions::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_newlines_do_not_survive_into_chunks() {
        let options = ChunkingOptions::new(3, 0).unwrap();
        let chunks = chunker("alpha\nbeta\n\ngamma delta", &options).unwrap();
        assert_eq!(chunks, vec!["alpha beta gamma".to_string(), "delta".to_string()]);
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        assert!(matches!(
            ChunkingOptions::new(0, 0),
            Err(RAGError::Chunking(_))
        ));
        assert!(matches!(
            ChunkingOptions::new(5, 5),
            Err(RAGError::Chunking(_))
        ));

        let bad = ChunkingOptions {
            chunk_size: 3,
            overlap: 7,
        };
        assert!(chunker("a b c d", &bad).is_err());
    }
}
