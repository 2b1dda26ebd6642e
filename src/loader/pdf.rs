//! PDF text extraction.
//!
//! Uses pdf-extract for text (better font encoding handling) and falls back
//! to walking the content streams with lopdf when pdf-extract fails or finds
//! no text.

use super::{DocumentKind, Extractor};
use crate::error::{ArbitroError, Result};
use lopdf::{Document, Object};
use std::path::Path;
use tracing::{debug, warn};

/// Extractor for `.pdf` files.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for PdfExtractor {
    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn kind(&self) -> DocumentKind {
        DocumentKind::Pdf
    }

    fn extract(&self, path: &Path) -> Result<String> {
        // pdf-extract panics on some malformed inputs
        let pages = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_by_pages(path)
        }));

        match pages {
            Ok(Ok(pages)) => {
                let text = pages.join("\n");
                if !text.trim().is_empty() {
                    return Ok(text);
                }
                debug!("pdf-extract found no text in {}, trying lopdf", path.display());
            }
            Ok(Err(e)) => {
                warn!("pdf-extract failed for {}: {}, trying lopdf", path.display(), e);
            }
            Err(_) => {
                warn!("pdf-extract panicked on {}, trying lopdf", path.display());
            }
        }

        extract_with_lopdf(path).map_err(|reason| ArbitroError::Extraction {
            path: path.display().to_string(),
            reason,
        })
    }
}

/// Walk page content streams and collect the operands of text-showing operators.
fn extract_with_lopdf(path: &Path) -> std::result::Result<String, String> {
    let doc = Document::load(path).map_err(|e| format!("failed to load PDF: {}", e))?;

    let mut pages_text = Vec::new();
    for (_page_num, page_id) in doc.get_pages() {
        let Ok(content) = doc.get_page_content(page_id) else {
            continue;
        };
        let operations = lopdf::content::Content::decode(&content)
            .map(|c| c.operations)
            .unwrap_or_default();

        let mut page = String::new();
        for op in operations {
            match op.operator.as_str() {
                "Tj" | "'" | "\"" => {
                    if let Some(Object::String(bytes, _)) = op.operands.last() {
                        page.push_str(&decode_pdf_string(bytes));
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        for item in items {
                            if let Object::String(bytes, _) = item {
                                page.push_str(&decode_pdf_string(bytes));
                            }
                        }
                    }
                }
                "Td" | "TD" | "T*" => {
                    if !page.is_empty() && !page.ends_with(char::is_whitespace) {
                        page.push(' ');
                    }
                }
                "ET" => {
                    if !page.is_empty() && !page.ends_with('\n') {
                        page.push('\n');
                    }
                }
                _ => {}
            }
        }
        pages_text.push(page);
    }

    let text = pages_text.join("\n");
    if text.trim().is_empty() {
        return Err("no extractable text".to_string());
    }
    Ok(text)
}

/// UTF-8 when valid, Latin-1 otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect())
}
