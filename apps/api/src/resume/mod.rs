//! Resume text extraction for uploaded PDF and DOCX files.

use std::io::{Cursor, Read};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Upload formats the resume analysis accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Docx,
}

impl ResumeFormat {
    /// Picks the format from the file extension, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(ResumeFormat::Pdf),
            "docx" => Some(ResumeFormat::Docx),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX container error: {0}")]
    Docx(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No text found in document")]
    EmptyText,
}

const DOCX_BODY_PART: &str = "word/document.xml";

// Text runs, tabs, line/page breaks, carriage returns and paragraph ends in WordprocessingML.
// Only the bare `<w:tab/>` is a tab character; `<w:tab w:pos=".."/>` inside `<w:tabs>` is a tab stop.
static DOCX_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab\s*/>|<w:(?:br|cr)(?:\s[^>]*)?/>|</w:p>")
        .expect("docx token regex is valid")
});

static XML_ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|lt|gt|quot|apos|amp);")
        .expect("xml entity regex is valid")
});

/// Extracts plain text from a resume file. CPU-bound; call from a blocking task.
pub fn extract_text(format: ResumeFormat, bytes: &[u8]) -> Result<String, ExtractError> {
    let text = match format {
        ResumeFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?,
        ResumeFormat::Docx => extract_docx_text(bytes)?,
    };

    if text.trim().is_empty() {
        return Err(ExtractError::EmptyText);
    }
    Ok(text)
}

fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCX_BODY_PART)?.read_to_string(&mut xml)?;
    Ok(docx_xml_to_text(&xml))
}

/// One line per paragraph; runs within a paragraph are concatenated.
fn docx_xml_to_text(xml: &str) -> String {
    let mut text = String::with_capacity(xml.len() / 4);
    for caps in DOCX_TOKEN_RE.captures_iter(xml) {
        if let Some(run) = caps.get(1) {
            text.push_str(&decode_xml_entities(run.as_str()));
            continue;
        }
        if caps[0].starts_with("<w:tab") {
            text.push('\t');
        } else {
            text.push('\n');
        }
    }
    text.trim_end().to_string()
}

/// Decodes the predefined XML entities and numeric character references in one pass.
/// Unknown or invalid references are left as written.
fn decode_xml_entities(s: &str) -> String {
    XML_ENTITY_RE
        .replace_all(s, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => {
                    let code = match entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCX_BODY_PART, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(ResumeFormat::from_file_name("cv.pdf"), Some(ResumeFormat::Pdf));
        assert_eq!(ResumeFormat::from_file_name("My CV.PDF"), Some(ResumeFormat::Pdf));
        assert_eq!(ResumeFormat::from_file_name("resume.docx"), Some(ResumeFormat::Docx));
        assert_eq!(ResumeFormat::from_file_name("resume.doc"), None);
        assert_eq!(ResumeFormat::from_file_name("resume"), None);
    }

    #[test]
    fn test_docx_xml_to_text_paragraphs_and_runs() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>
            <w:p><w:r><w:t xml:space="preserve">Rust </w:t></w:r><w:r><w:t>&amp; Go</w:t></w:r><w:r><w:tab/><w:t>2021</w:t></w:r></w:p>
        </w:body></w:document>"#;
        assert_eq!(docx_xml_to_text(xml), "Jane Doe\nRust & Go\t2021");
    }

    #[test]
    fn test_docx_xml_to_text_breaks_and_character_references() {
        let xml = r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
            <w:r><w:t>Jane&#8217;s CV</w:t><w:br w:type="page"/><w:t>2019&#x2013;2023</w:t><w:cr/><w:t>&amp;lt; kept</w:t></w:r></w:p>"#;
        assert_eq!(docx_xml_to_text(xml), "Jane\u{2019}s CV\n2019\u{2013}2023\n&lt; kept");
    }

    #[test]
    fn test_decode_leaves_unknown_references() {
        assert_eq!(decode_xml_entities("&nbsp; &#xZZ; &#1114112;"), "&nbsp; &#xZZ; &#1114112;");
    }

    #[test]
    fn test_extract_docx_from_zip() {
        let bytes = docx_with_body(
            "<w:document><w:body><w:p><w:r><w:t>Experience</w:t></w:r></w:p></w:body></w:document>",
        );
        let text = extract_text(ResumeFormat::Docx, &bytes).unwrap();
        assert_eq!(text, "Experience");
    }

    #[test]
    fn test_extract_docx_without_text_is_empty_error() {
        let bytes = docx_with_body("<w:document><w:body><w:p/></w:body></w:document>");
        let err = extract_text(ResumeFormat::Docx, &bytes).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyText));
    }

    #[test]
    fn test_extract_docx_rejects_non_zip() {
        let err = extract_text(ResumeFormat::Docx, b"plain text, not a zip").unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }

    #[test]
    fn test_extract_pdf_rejects_garbage() {
        let err = extract_text(ResumeFormat::Pdf, b"not a pdf at all").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn test_excerpt_counts_characters() {
        assert_eq!(excerpt("héllo wörld", 5), "héllo");
        assert_eq!(excerpt("short", 1500), "short");
    }
}
