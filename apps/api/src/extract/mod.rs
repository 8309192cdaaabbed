//! Resume document extraction.
//!
//! Turns an uploaded binary document (PDF or DOCX container) into plain text,
//! or a typed failure. Document parsing on arbitrary user-supplied bytes is
//! inherently unreliable, so this module's main duty is containment: every
//! parser fault comes back as an `ExtractError`, never an unhandled panic.

use bytes::Bytes;
use thiserror::Error;

mod docx;
mod pdf;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Declared document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Docx,
}

impl MediaType {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            PDF_MIME => Some(MediaType::Pdf),
            DOCX_MIME => Some(MediaType::Docx),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// The document parsed fine but yielded no usable text after trimming.
    #[error("{0}")]
    NoText(&'static str),

    #[error("failed to read document: {0}")]
    Malformed(String),
}

/// An uploaded document: raw bytes plus the declared media type.
/// Transient — consumed exactly once by [`extract`], never stored.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub media_type: String,
    pub bytes: Bytes,
}

/// Extracts plain text from an uploaded resume.
///
/// Media types outside {PDF, DOCX} are rejected before any parser runs.
/// Success implies non-empty trimmed content. Deterministic for a given
/// input; no side effects.
pub fn extract(document: &ResumeDocument) -> Result<String, ExtractError> {
    match MediaType::from_mime(&document.media_type) {
        Some(MediaType::Pdf) => pdf::extract_text(&document.bytes),
        Some(MediaType::Docx) => docx::extract_text(&document.bytes),
        None => Err(ExtractError::UnsupportedFormat(document.media_type.clone())),
    }
}
