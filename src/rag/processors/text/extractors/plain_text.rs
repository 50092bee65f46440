// Plain text extractor

use super::base::TextExtractor;
use crate::rag::RAGResult;
use async_trait::async_trait;

pub struct PlainTextExtractor {
    content: Vec<u8>,
}

impl PlainTextExtractor {
    /// Decode as UTF-8, falling back to Latin-1 where every byte is its own code point
    fn decode(bytes: &[u8]) -> String {
        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => {
                tracing::debug!("Text file is not valid UTF-8, decoding as Latin-1");
                bytes.iter().map(|&b| b as char).collect()
            }
        }
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    async fn extract_text(&self) -> RAGResult<String> {
        Ok(Self::decode(&self.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_utf8_text() {
        let extractor = PlainTextExtractor::new("héllo wörld".as_bytes().to_vec());
        assert_eq!(extractor.extract_text().await.unwrap(), "héllo wörld");
    }

    #[tokio::test]
    async fn test_latin1_fallback() {
        // "café" in Latin-1
        let extractor = PlainTextExtractor::new(vec![0x63, 0x61, 0x66, 0xE9]);
        assert_eq!(extractor.extract_text().await.unwrap(), "café");
    }
}
