//! Native markup record format
//!
//! One record per paragraph identity:
//! `<paragraph name=".." start-page=".." start-offset=".." end-page=".."
//! end-offset=".."/>`. Export refuses with a typed `IncompletePair` listing
//! every half-marked paragraph before anything is written; the legacy
//! behavior of asserting fatally on the first offender is gone.

use std::io::Cursor;
use std::path::Path;

use chrono::Utc;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{MarkupError, Result};
use crate::marks::MarkKind;
use crate::registry::ParagraphRegistry;

/// One persisted paragraph record
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphRecord {
    pub name: String,
    pub start_page: u32,
    pub start_offset: f64,
    pub end_page: u32,
    pub end_offset: f64,
}

/// Serialize every fully paired paragraph to markup XML
///
/// Paragraphs whose entry holds no marks at all (emptied by deletion) are
/// skipped; paragraphs with exactly one mark abort the export.
pub fn export_markup(registry: &ParagraphRegistry) -> Result<String> {
    let offenders: Vec<String> = registry
        .entries()
        .filter(|(_, entry)| entry.start.is_some() != entry.end.is_some())
        .map(|(id, _)| id.clone())
        .collect();
    if !offenders.is_empty() {
        return Err(MarkupError::IncompletePair { paragraphs: offenders });
    }

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new("markup");
    root.push_attribute(("generated", Utc::now().to_rfc3339().as_str()));
    writer.write_event(Event::Start(root))?;

    for (paragraph_id, entry) in registry.entries() {
        let (Some(start), Some(end)) = (&entry.start, &entry.end) else {
            continue;
        };
        let mut record = BytesStart::new("paragraph");
        record.push_attribute(("name", paragraph_id.as_str()));
        record.push_attribute(("start-page", start.page.to_string().as_str()));
        record.push_attribute(("start-offset", start.offset.to_string().as_str()));
        record.push_attribute(("end-page", end.page.to_string().as_str()));
        record.push_attribute(("end-offset", end.offset.to_string().as_str()));
        writer.write_event(Event::Empty(record))?;
    }

    writer.write_event(Event::End(BytesEnd::new("markup")))?;

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

/// Parse markup XML into paragraph records
pub fn parse_markup(xml: &str) -> Result<Vec<ParagraphRecord>> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Empty(element) | Event::Start(element)
                if element.name().as_ref() == b"paragraph" =>
            {
                records.push(parse_record(&element)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(records)
}

fn parse_record(element: &BytesStart<'_>) -> Result<ParagraphRecord> {
    let mut name = None;
    let mut start_page = None;
    let mut start_offset = None;
    let mut end_page = None;
    let mut end_offset = None;

    for attribute in element.attributes() {
        let attribute: Attribute =
            attribute.map_err(|e| MarkupError::SourceLoad(format!("bad attribute: {}", e)))?;
        let value = attribute
            .unescape_value()
            .map_err(|e| MarkupError::SourceLoad(format!("bad attribute value: {}", e)))?;
        match attribute.key.as_ref() {
            b"name" => name = Some(value.into_owned()),
            b"start-page" => start_page = Some(parse_number(&value, "start-page")?),
            b"start-offset" => start_offset = Some(parse_float(&value, "start-offset")?),
            b"end-page" => end_page = Some(parse_number(&value, "end-page")?),
            b"end-offset" => end_offset = Some(parse_float(&value, "end-offset")?),
            _ => {}
        }
    }

    let missing = |field: &str| MarkupError::SourceLoad(format!("record missing {}", field));
    Ok(ParagraphRecord {
        name: name.ok_or_else(|| missing("name"))?,
        start_page: start_page.ok_or_else(|| missing("start-page"))?,
        start_offset: start_offset.ok_or_else(|| missing("start-offset"))?,
        end_page: end_page.ok_or_else(|| missing("end-page"))?,
        end_offset: end_offset.ok_or_else(|| missing("end-offset"))?,
    })
}

fn parse_number(raw: &str, field: &str) -> Result<u32> {
    raw.parse()
        .map_err(|_| MarkupError::SourceLoad(format!("invalid {}: {}", field, raw)))
}

fn parse_float(raw: &str, field: &str) -> Result<f64> {
    raw.parse()
        .map_err(|_| MarkupError::SourceLoad(format!("invalid {}: {}", field, raw)))
}

/// Build a registry by replaying markup records as add-mark pairs
pub fn import_markup(xml: &str) -> Result<ParagraphRegistry> {
    let mut registry = ParagraphRegistry::new();
    for record in parse_markup(xml)? {
        registry.add_mark(&record.name, MarkKind::Start, record.start_page, record.start_offset)?;
        registry.add_mark(&record.name, MarkKind::End, record.end_page, record.end_offset)?;
    }
    tracing::info!(paragraphs = registry.entries().count(), "Imported markup");
    Ok(registry)
}

/// Write the markup file; nothing touches the disk when export is refused
pub fn write_markup_file(path: impl AsRef<Path>, registry: &ParagraphRegistry) -> Result<()> {
    let xml = export_markup(registry)?;
    std::fs::write(path.as_ref(), xml)?;
    tracing::info!(path = %path.as_ref().display(), "Wrote markup file");
    Ok(())
}

/// Read and import a markup file
pub fn read_markup_file(path: impl AsRef<Path>) -> Result<ParagraphRegistry> {
    let xml = std::fs::read_to_string(path.as_ref())
        .map_err(|e| MarkupError::SourceLoad(format!("{}: {}", path.as_ref().display(), e)))?;
    import_markup(&xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_pair(registry: &mut ParagraphRegistry, id: &str, start: (u32, f64), end: (u32, f64)) {
        registry.add_mark(id, MarkKind::Start, start.0, start.1).unwrap();
        registry.add_mark(id, MarkKind::End, end.0, end.1).unwrap();
    }

    #[test]
    fn test_round_trip_preserves_records() {
        let mut registry = ParagraphRegistry::new();
        add_pair(&mut registry, "lesson-1", (5, 10.5), (25, 190.25));
        add_pair(&mut registry, "lesson-2", (30, 0.0), (31, 44.0));

        let xml = export_markup(&registry).unwrap();
        let imported = import_markup(&xml).unwrap();

        for id in ["lesson-1", "lesson-2"] {
            let original = registry.entry(id).unwrap();
            let restored = imported.entry(id).unwrap();
            let (os, oe) = (original.start.as_ref().unwrap(), original.end.as_ref().unwrap());
            let (rs, re) = (restored.start.as_ref().unwrap(), restored.end.as_ref().unwrap());
            assert_eq!((rs.page, rs.offset), (os.page, os.offset));
            assert_eq!((re.page, re.offset), (oe.page, oe.offset));
        }
    }

    #[test]
    fn test_export_refuses_and_lists_all_offenders() {
        let mut registry = ParagraphRegistry::new();
        add_pair(&mut registry, "ok", (1, 0.0), (2, 0.0));
        registry.add_mark("half-a", MarkKind::Start, 5, 10.0).unwrap();
        registry.add_mark("half-b", MarkKind::Start, 9, 10.0).unwrap();

        match export_markup(&registry) {
            Err(MarkupError::IncompletePair { paragraphs }) => {
                assert_eq!(paragraphs, vec!["half-a".to_string(), "half-b".to_string()]);
            }
            other => panic!("expected IncompletePair, got {:?}", other),
        }
    }

    #[test]
    fn test_emptied_entries_are_skipped() {
        let mut registry = ParagraphRegistry::new();
        add_pair(&mut registry, "gone", (5, 10.0), (25, 190.0));
        registry.delete_marks(
            &[
                crate::registry::Selection::Mark {
                    paragraph_id: "gone".into(),
                    kind: MarkKind::Start,
                },
                crate::registry::Selection::Mark {
                    paragraph_id: "gone".into(),
                    kind: MarkKind::End,
                },
            ],
            true,
        );

        let xml = export_markup(&registry).unwrap();
        assert!(!xml.contains("gone"));
    }

    #[test]
    fn test_record_attributes_are_written() {
        let mut registry = ParagraphRegistry::new();
        add_pair(&mut registry, "p1", (5, 10.0), (25, 190.0));

        let xml = export_markup(&registry).unwrap();
        assert!(xml.contains("generated="));
        assert!(xml.contains(r#"name="p1""#));
        assert!(xml.contains(r#"start-page="5""#));
        assert!(xml.contains(r#"end-page="25""#));
    }

    #[test]
    fn test_file_round_trip() {
        let mut registry = ParagraphRegistry::new();
        add_pair(&mut registry, "p1", (5, 10.0), (25, 190.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markup.xml");
        write_markup_file(&path, &registry).unwrap();

        let imported = read_markup_file(&path).unwrap();
        let entry = imported.entry("p1").unwrap();
        assert_eq!(entry.start.as_ref().unwrap().page, 5);
        assert_eq!(entry.end.as_ref().unwrap().offset, 190.0);
    }

    #[test]
    fn test_missing_file_is_a_source_load_failure() {
        let err = read_markup_file("/nonexistent/markup.xml").unwrap_err();
        assert!(matches!(err, MarkupError::SourceLoad(_)));
    }

    #[test]
    fn test_malformed_record_is_rejected() {
        let xml = r#"<?xml version="1.0"?><markup><paragraph name="p1" start-page="x"/></markup>"#;
        assert!(matches!(import_markup(xml), Err(MarkupError::SourceLoad(_))));
    }
}
