// DOCX text extractor: reads paragraph runs straight out of word/document.xml

use super::base::TextExtractor;
use crate::rag::{RAGError, RAGResult};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

const BODY: &[u8] = b"w:body";
const PARAGRAPH: &[u8] = b"w:p";
const HYPERLINK: &[u8] = b"w:hyperlink";
const RUN: &[u8] = b"w:r";
const TEXT: &[u8] = b"w:t";
const TAB: &[u8] = b"w:tab";
const BREAK: &[u8] = b"w:br";
const CARRIAGE_RETURN: &[u8] = b"w:cr";

pub struct DocxExtractor {
    content: Vec<u8>,
}

impl DocxExtractor {
    fn read_document_xml(bytes: &[u8]) -> Result<String, String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
        let mut entry = archive
            .by_name("word/document.xml")
            .map_err(|e| e.to_string())?;
        let mut xml = String::new();
        entry.read_to_string(&mut xml).map_err(|e| e.to_string())?;
        Ok(xml)
    }

    /// Text of every paragraph that sits directly in the document body.
    ///
    /// Only run-level content counts (`w:t`, tabs, breaks), so paragraphs
    /// nested inside text boxes or tables never leak into or cut short the
    /// paragraph that contains them.
    fn paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
        let mut reader = Reader::from_str(xml);
        let mut open: Vec<Vec<u8>> = Vec::new();
        let mut paragraphs = Vec::new();
        let mut current: Option<String> = None;

        loop {
            match reader.read_event()? {
                Event::Start(element) => {
                    let name = element.name().as_ref().to_vec();
                    if name == PARAGRAPH && parent_is(&open, BODY) {
                        current = Some(String::new());
                    }
                    open.push(name);
                }
                Event::Empty(element) => {
                    let name = element.name();
                    let name = name.as_ref();
                    if name == PARAGRAPH && parent_is(&open, BODY) {
                        paragraphs.push(String::new());
                    } else if let Some(text) = current.as_mut().filter(|_| in_body_run(&open)) {
                        match name {
                            TAB => text.push('\t'),
                            BREAK | CARRIAGE_RETURN => text.push('\n'),
                            _ => {}
                        }
                    }
                }
                Event::Text(content) => {
                    if let Some((TEXT, parents)) = open.split_last().map(|(n, p)| (n.as_slice(), p)) {
                        if let Some(text) = current.as_mut().filter(|_| in_body_run(parents)) {
                            text.push_str(&content.unescape()?);
                        }
                    }
                }
                Event::End(_) => {
                    if open.pop().as_deref() == Some(PARAGRAPH) && parent_is(&open, BODY) {
                        if let Some(text) = current.take() {
                            paragraphs.push(text);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(paragraphs)
    }
}

fn parent_is(open: &[Vec<u8>], name: &[u8]) -> bool {
    open.last().map(Vec::as_slice) == Some(name)
}

/// Whether the innermost open element is a run of a top-level paragraph,
/// either directly or through a hyperlink.
fn in_body_run(open: &[Vec<u8>]) -> bool {
    let names: Vec<&[u8]> = open.iter().rev().take(4).map(Vec::as_slice).collect();
    match names.as_slice() {
        [RUN, PARAGRAPH, BODY, ..] => true,
        [RUN, HYPERLINK, PARAGRAPH, BODY] => true,
        _ => false,
    }
}

#[async_trait]
impl TextExtractor for DocxExtractor {
    fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    async fn extract_text(&self) -> RAGResult<String> {
        let xml = Self::read_document_xml(&self.content).map_err(|e| {
            tracing::error!("DOCX extraction failed: {}", e);
            RAGError::FileProcessing(format!("Failed to extract text from DOCX: {}", e))
        })?;

        let paragraphs = Self::paragraphs(&xml).map_err(|e| {
            tracing::error!("DOCX XML parsing failed: {}", e);
            RAGError::FileProcessing(format!("Failed to extract text from DOCX: {}", e))
        })?;
        Ok(paragraphs.join("\n"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// Build a minimal .docx archive around the given body XML
    pub(crate) fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_paragraphs_are_joined_with_newlines() {
        let bytes = docx_with_body(
            r#"<w:p w:rsidR="00A1"><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>Fish &amp; chips</w:t><w:tab/><w:t>done</w:t></w:r></w:p>"#,
        );

        let text = DocxExtractor::new(bytes).extract_text().await.unwrap();
        assert_eq!(text, "Hello world\n\nFish & chips\tdone");
    }

    #[tokio::test]
    async fn test_text_box_does_not_cut_paragraph_short() {
        let bytes = docx_with_body(
            r#"<w:p><w:r><w:t>Before</w:t></w:r><w:r><w:pict><v:shape><v:textbox><w:txbxContent><w:p><w:r><w:t>Boxed</w:t></w:r></w:p></w:txbxContent></v:textbox></v:shape></w:pict></w:r><w:r><w:t xml:space="preserve"> After</w:t></w:r></w:p><w:p><w:r><w:t>Next</w:t></w:r></w:p>"#,
        );

        let text = DocxExtractor::new(bytes).extract_text().await.unwrap();
        assert_eq!(text, "Before After\nNext");
    }

    #[tokio::test]
    async fn test_character_references_are_decoded() {
        let bytes = docx_with_body(
            r#"<w:p><w:hyperlink r:id="rId4"><w:r><w:t>it&#8217;s &#x41;BC &lt;ok&gt;</w:t></w:r></w:hyperlink></w:p>"#,
        );

        let text = DocxExtractor::new(bytes).extract_text().await.unwrap();
        assert_eq!(text, "it\u{2019}s ABC <ok>");
    }

    #[tokio::test]
    async fn test_malformed_xml_is_a_processing_error() {
        let bytes = docx_with_body("<w:p><w:r><w:t>open</w:r></w:p>");
        let err = DocxExtractor::new(bytes).extract_text().await.unwrap_err();
        assert!(matches!(err, RAGError::FileProcessing(_)));
    }

    #[tokio::test]
    async fn test_not_a_zip_is_a_processing_error() {
        let err = DocxExtractor::new(b"plain bytes".to_vec())
            .extract_text()
            .await
            .unwrap_err();
        assert!(matches!(err, RAGError::FileProcessing(_)));
    }

    #[tokio::test]
    async fn test_zip_without_document_xml() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.txt", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(b"x").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = DocxExtractor::new(bytes).extract_text().await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to extract text from DOCX"));
    }
}
