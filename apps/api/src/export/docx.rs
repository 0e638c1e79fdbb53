//! DOCX export adapter.
//!
//! Builds a minimal WordprocessingML package in-process. The document
//! builder exposes headings, paragraphs, and bullet lines only — the OOXML
//! details stay behind it. Bullets are plain runs prefixed with a bullet
//! glyph; no numbering part is emitted.

use std::io::{Cursor, Write};

use anyhow::Context;
use bytes::Bytes;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::export::payload::{item_heading, item_subline, ExportContent, ExportPayload};
use crate::sections::model::Item;

const WPML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

// Run sizes in half-points.
const SIZE_TITLE: u32 = 36;
const SIZE_HEADING: u32 = 28;

/// Streams paragraphs, headings, and text runs into `word/document.xml`.
struct DocumentBuilder {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl DocumentBuilder {
    fn new() -> anyhow::Result<Self> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut document = BytesStart::new("w:document");
        document.push_attribute(("xmlns:w", WPML_NS));
        writer.write_event(Event::Start(document))?;
        writer.write_event(Event::Start(BytesStart::new("w:body")))?;

        Ok(DocumentBuilder { writer })
    }

    fn title(&mut self, text: &str) -> anyhow::Result<()> {
        self.run_paragraph(text, true, Some(SIZE_TITLE))
    }

    fn heading(&mut self, text: &str) -> anyhow::Result<()> {
        self.run_paragraph(text, true, Some(SIZE_HEADING))
    }

    fn strong(&mut self, text: &str) -> anyhow::Result<()> {
        self.run_paragraph(text, true, None)
    }

    fn paragraph(&mut self, text: &str) -> anyhow::Result<()> {
        self.run_paragraph(text, false, None)
    }

    fn bullet(&mut self, text: &str) -> anyhow::Result<()> {
        self.run_paragraph(&format!("• {text}"), false, None)
    }

    fn run_paragraph(&mut self, text: &str, bold: bool, size: Option<u32>) -> anyhow::Result<()> {
        self.writer.write_event(Event::Start(BytesStart::new("w:p")))?;
        self.writer.write_event(Event::Start(BytesStart::new("w:r")))?;

        if bold || size.is_some() {
            self.writer
                .write_event(Event::Start(BytesStart::new("w:rPr")))?;
            if bold {
                self.writer
                    .write_event(Event::Empty(BytesStart::new("w:b")))?;
            }
            if let Some(half_points) = size {
                let mut sz = BytesStart::new("w:sz");
                sz.push_attribute(("w:val", half_points.to_string().as_str()));
                self.writer.write_event(Event::Empty(sz))?;
            }
            self.writer
                .write_event(Event::End(BytesEnd::new("w:rPr")))?;
        }

        let mut t = BytesStart::new("w:t");
        t.push_attribute(("xml:space", "preserve"));
        self.writer.write_event(Event::Start(t))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.writer.write_event(Event::End(BytesEnd::new("w:t")))?;

        self.writer.write_event(Event::End(BytesEnd::new("w:r")))?;
        self.writer.write_event(Event::End(BytesEnd::new("w:p")))?;
        Ok(())
    }

    fn finish(mut self) -> anyhow::Result<Vec<u8>> {
        self.writer
            .write_event(Event::End(BytesEnd::new("w:body")))?;
        self.writer
            .write_event(Event::End(BytesEnd::new("w:document")))?;
        Ok(self.writer.into_inner().into_inner())
    }
}

/// Renders the export payload as a DOCX binary.
pub fn render_docx(payload: &ExportPayload) -> anyhow::Result<Bytes> {
    let mut doc = DocumentBuilder::new()?;

    let info = &payload.personal_info;
    if !info.full_name.is_empty() {
        doc.title(&info.full_name)?;
    } else {
        doc.title(&payload.title)?;
    }
    if let Some(headline) = &info.headline {
        doc.paragraph(headline)?;
    }
    let contact: Vec<&str> = [
        info.email.as_deref(),
        info.phone.as_deref(),
        info.location.as_deref(),
        info.website.as_deref(),
        info.linkedin.as_deref(),
        info.github.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !contact.is_empty() {
        doc.paragraph(&contact.join(" · "))?;
    }
    if let Some(summary) = &info.summary {
        doc.paragraph(summary)?;
    }

    for section in &payload.sections {
        doc.heading(&section.title)?;
        match &section.content {
            ExportContent::Items { items } => write_items(&mut doc, items)?,
            ExportContent::SkillLine { text } => doc.paragraph(text)?,
            ExportContent::Custom { content, items } => {
                if !content.trim().is_empty() {
                    doc.paragraph(content)?;
                }
                write_items(&mut doc, items)?;
            }
        }
    }

    package(doc.finish()?)
}

fn write_items(doc: &mut DocumentBuilder, items: &[Item]) -> anyhow::Result<()> {
    for item in items {
        doc.strong(&item_heading(item))?;
        if let Some(subline) = item_subline(item) {
            doc.paragraph(&subline)?;
        }
        if let Some(description) = &item.description {
            doc.paragraph(description)?;
        }
        for bullet in &item.bullet_points {
            doc.bullet(&bullet.text)?;
        }
    }
    Ok(())
}

/// Wraps `word/document.xml` into the OPC zip package.
fn package(document_xml: Vec<u8>) -> anyhow::Result<Bytes> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(PACKAGE_RELS_XML.as_bytes())?;
    zip.start_file("word/document.xml", options)?;
    zip.write_all(&document_xml)?;

    let cursor = zip.finish().context("failed to finalize DOCX package")?;
    Ok(Bytes::from(cursor.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::PersonalInfo;
    use crate::sections::binding::RenderSequence;
    use crate::sections::engine::{apply_all, Edit, ResumeContent};
    use crate::sections::model::{ExperienceData, ItemData, SkillData};
    use std::io::Read;

    fn make_payload() -> ExportPayload {
        let mut item = Item::new(ItemData::Experience(ExperienceData {
            role: "R&D Engineer".to_string(),
            company: "Acme".to_string(),
            location: None,
            start_date: Some("2020".to_string()),
            end_date: Some("2023".to_string()),
        }));
        item.bullet_points = vec![crate::sections::model::BulletPoint::new(
            "Cut build times by 60%",
        )];

        let content = apply_all(
            &ResumeContent::default(),
            &[
                Edit::AddItem {
                    section: "experience".to_string(),
                    item,
                },
                Edit::AddItem {
                    section: "skills".to_string(),
                    item: Item::new(ItemData::Skill(SkillData {
                        name: "Rust".to_string(),
                        level: None,
                    })),
                },
            ],
        )
        .unwrap();

        let info = PersonalInfo {
            full_name: "Ada Lovelace".to_string(),
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        };
        let sequence = RenderSequence::bind(&content.sections, &[], &[]);
        ExportPayload::from_sequence("Backend roles", &info, &sequence)
    }

    fn unzip_entry(data: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_package_has_required_parts() {
        let bytes = render_docx(&make_payload()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(&bytes[..])).unwrap();
        for name in ["[Content_Types].xml", "_rels/.rels", "word/document.xml"] {
            assert!(archive.by_name(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn test_document_preserves_section_order_and_content() {
        let bytes = render_docx(&make_payload()).unwrap();
        let xml = unzip_entry(&bytes, "word/document.xml");

        let name_pos = xml.find("Ada Lovelace").expect("name present");
        let exp_pos = xml.find("Experience").expect("experience heading");
        let skills_pos = xml.find("Skills").expect("skills heading");
        assert!(name_pos < exp_pos && exp_pos < skills_pos);

        assert!(xml.contains("2020 – 2023"));
        assert!(xml.contains("• Cut build times by 60%"));
    }

    #[test]
    fn test_text_is_xml_escaped() {
        let bytes = render_docx(&make_payload()).unwrap();
        let xml = unzip_entry(&bytes, "word/document.xml");
        assert!(xml.contains("R&amp;D Engineer"));
        assert!(!xml.contains("R&D Engineer"));
    }

    #[test]
    fn test_rendering_does_not_consume_the_payload() {
        let payload = make_payload();
        let first = render_docx(&payload).unwrap();
        let second = render_docx(&payload).unwrap();
        assert_eq!(first, second);
    }
}
