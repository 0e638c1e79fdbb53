//! Plain-text extraction from uploaded resume files.

use std::io::{Cursor, Read};

use anyhow::Context;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Supported upload formats, decided by file extension. MIME sniffing is a
/// client-side concern; the extractors fail cleanly on mislabeled bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    Docx,
}

impl SourceFormat {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = std::path::Path::new(file_name)
            .extension()
            .and_then(|v| v.to_str())
            .map(|v| v.to_ascii_lowercase())?;
        match extension.as_str() {
            "pdf" => Some(SourceFormat::Pdf),
            "docx" => Some(SourceFormat::Docx),
            _ => None,
        }
    }
}

/// Extracts the text content of an uploaded file.
pub fn extract_text(format: SourceFormat, data: &[u8]) -> anyhow::Result<String> {
    match format {
        SourceFormat::Pdf => {
            pdf_extract::extract_text_from_mem(data).context("failed to extract PDF text")
        }
        SourceFormat::Docx => docx_text(data),
    }
}

/// Reads `word/document.xml` out of the DOCX archive and joins the text of
/// each paragraph (`w:p`) into one line.
fn docx_text(data: &[u8]) -> anyhow::Result<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).context("upload is not a DOCX archive")?;
    let mut document = archive
        .by_name("word/document.xml")
        .context("DOCX archive has no word/document.xml")?;
    let mut xml = String::new();
    document.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut lines: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut in_run_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => paragraph.clear(),
                b"w:t" => in_run_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    if !paragraph.trim().is_empty() {
                        lines.push(paragraph.trim().to_string());
                    }
                    paragraph.clear();
                }
                b"w:t" => in_run_text = false,
                _ => {}
            },
            Event::Text(e) => {
                if in_run_text {
                    paragraph.push_str(&e.xml_content()?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Builds a minimal DOCX archive holding the given paragraphs.
    fn make_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        let document = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );

        let mut cursor = Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document.as_bytes()).unwrap();
        writer.finish().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(
            SourceFormat::from_file_name("resume.pdf"),
            Some(SourceFormat::Pdf)
        );
        assert_eq!(
            SourceFormat::from_file_name("Resume.DOCX"),
            Some(SourceFormat::Docx)
        );
        assert_eq!(SourceFormat::from_file_name("resume.txt"), None);
        assert_eq!(SourceFormat::from_file_name("no-extension"), None);
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let data = make_docx(&["Ada Lovelace", "EXPERIENCE", "Engineer at Analytical Engines"]);
        let text = extract_text(SourceFormat::Docx, &data).unwrap();
        assert_eq!(
            text,
            "Ada Lovelace\nEXPERIENCE\nEngineer at Analytical Engines"
        );
    }

    #[test]
    fn test_docx_empty_paragraphs_are_skipped() {
        let data = make_docx(&["First", "", "Second"]);
        let text = extract_text(SourceFormat::Docx, &data).unwrap();
        assert_eq!(text, "First\nSecond");
    }

    #[test]
    fn test_non_archive_bytes_fail_cleanly() {
        assert!(extract_text(SourceFormat::Docx, b"plain text").is_err());
    }
}
