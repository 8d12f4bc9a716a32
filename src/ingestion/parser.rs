//! PDF text extraction with page-level content

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Parsed document with extracted text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Full extracted text
    pub content: String,
    /// SHA-256 hash of the raw file bytes
    pub content_hash: String,
    /// Total pages from the PDF catalog
    pub total_pages: Option<u32>,
    /// Page-level content
    pub pages: Vec<PageContent>,
}

/// Content from a single page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Text content of the page
    pub content: String,
}

/// PDF file parser
pub struct PdfParser;

impl PdfParser {
    /// Check whether a filename looks like a PDF upload
    pub fn is_pdf(filename: &str) -> bool {
        filename
            .rsplit('.')
            .next()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
    }

    /// Parse an uploaded PDF into page-level text
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        if !Self::is_pdf(filename) {
            let extension = filename.rsplit('.').next().unwrap_or("").to_string();
            return Err(Error::UnsupportedFileType(extension));
        }

        let raw = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        // pdf-extract separates pages with form feeds when it can; fall back
        // to treating the document as a single page otherwise.
        let pages: Vec<PageContent> = raw
            .split('\u{0c}')
            .map(Self::cleanup_text)
            .enumerate()
            .filter(|(_, text)| !text.is_empty())
            .map(|(i, text)| PageContent {
                page_number: i as u32 + 1,
                content: text,
            })
            .collect();

        if pages.is_empty() {
            return Err(Error::file_parse(
                filename,
                "No text content could be extracted from PDF",
            ));
        }

        let content = pages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        // Page count from the PDF catalog is more reliable than form feeds
        let total_pages = match lopdf::Document::load_mem(data) {
            Ok(doc) => Some(doc.get_pages().len() as u32),
            Err(_) => Some(pages.len() as u32),
        };

        Ok(ParsedDocument {
            content_hash: hash_bytes(data),
            content,
            total_pages,
            pages,
        })
    }

    /// Strip null bytes and collapse blank lines from extracted text
    fn cleanup_text(text: &str) -> String {
        text.replace('\0', "")
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// SHA-256 hash of raw bytes, hex-encoded
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
