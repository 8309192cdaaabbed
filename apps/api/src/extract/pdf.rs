use std::panic::{catch_unwind, AssertUnwindSafe};

use super::ExtractError;

pub(super) const NO_TEXT_REASON: &str = "no text found (possibly a scanned image)";

/// Extracts text page-by-page in page order. Pages with no extractable text
/// (image-only scans) contribute nothing; each non-empty page gets a trailing
/// newline.
///
/// pdf-extract can panic on malformed input, so the call is wrapped in
/// `catch_unwind` and a panic is reported like any other parse failure.
pub(super) fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| ExtractError::Malformed("PDF parser fault".to_string()))?
    .map_err(|e| ExtractError::Malformed(e.to_string()))?;

    let mut text = String::new();
    for page in &pages {
        if !page.is_empty() {
            text.push_str(page);
            text.push('\n');
        }
    }

    if text.trim().is_empty() {
        return Err(ExtractError::NoText(NO_TEXT_REASON));
    }
    Ok(text)
}
