use std::io::{Cursor, Read};

use quick_xml::events::{BytesRef, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use super::ExtractError;

pub(super) const NO_TEXT_REASON: &str = "no text found in document";

/// Extracts the text of every non-empty paragraph, in document order,
/// separated by a single newline.
///
/// A DOCX file is a zip container; the body lives in `word/document.xml` as
/// WordprocessingML, with paragraphs in `<w:p>` elements and literal text in
/// `<w:t>` runs.
pub(super) fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Malformed(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Malformed(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Malformed(e.to_string()))?;

    let paragraphs = paragraphs_from_xml(&xml)?;
    if paragraphs.is_empty() {
        return Err(ExtractError::NoText(NO_TEXT_REASON));
    }
    Ok(paragraphs.join("\n"))
}

/// Pull-parses WordprocessingML, collecting the concatenated `<w:t>` text of
/// each `<w:p>` whose trimmed content is non-empty (the scanned/empty
/// paragraph filter).
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => current.clear(),
                b"w:t" => in_text_run = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:p" => {
                    if !current.trim().is_empty() {
                        paragraphs.push(current.clone());
                    }
                    current.clear();
                }
                b"w:t" => in_text_run = false,
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let chunk = t
                    .xml_content()
                    .map_err(|e| ExtractError::Malformed(e.to_string()))?;
                current.push_str(&chunk);
            }
            // Entity references arrive as separate events, not as part of
            // the surrounding text; dropping them would corrupt any resume
            // containing `&`, `<`, or `>`.
            Ok(Event::GeneralRef(r)) if in_text_run => {
                current.push(resolve_reference(&r)?);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ExtractError::Malformed(e.to_string())),
        }
    }

    Ok(paragraphs)
}

/// Resolves an entity reference to its character: the five predefined XML
/// entities by name, anything else as a numeric character reference.
fn resolve_reference(reference: &BytesRef) -> Result<char, ExtractError> {
    let name = reference
        .decode()
        .map_err(|e| ExtractError::Malformed(e.to_string()))?;
    match name.as_ref() {
        "amp" => Ok('&'),
        "lt" => Ok('<'),
        "gt" => Ok('>'),
        "apos" => Ok('\''),
        "quot" => Ok('"'),
        _ => reference
            .resolve_char_ref()
            .map_err(|e| ExtractError::Malformed(e.to_string()))?
            .ok_or_else(|| {
                ExtractError::Malformed(format!("unresolvable entity reference '&{name};'"))
            }),
    }
}
