use std::fs;

use super::json_layout::load_layout_json;
use super::pdftohtml::{PdftohtmlXmlParser, parse_pdfinfo_title};
use crate::model::{DocumentMetadata, RawDocument};
use crate::outline::{ClassifierConfig, OutlineClassifier, SPAN_FLAG_BOLD, SPAN_FLAG_ITALIC};

const SAMPLE_XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE pdf2xml SYSTEM "pdf2xml.dtd">
<pdf2xml producer="poppler" version="22.02.0">
<page number="1" position="absolute" top="0" left="0" height="792" width="612">
	<fontspec id="0" size="24" family="Times" color="#000000"/>
	<fontspec id="1" size="12" family="Times" color="#000000"/>
<text top="100" left="180" width="252" height="28" font="0"><b>Annual Report</b></text>
<text top="100" left="440" width="40" height="28" font="0"><b>2024</b></text>
<text top="200" left="72" width="400" height="14" font="1">First body line &amp; more</text>
<text top="215" left="72" width="380" height="14" font="1">Second body line&#160;here</text>
<text top="300" left="72" width="380" height="14" font="9">Unknown font text</text>
<text top="400" left="72" width="200" height="14" font="1"><i>Note</i> set apart</text>
</page>
<page number="2" position="absolute" top="0" left="0" height="792" width="612">
<text top="120" left="72" width="100" height="14" font="1">Page two</text>
</page>
</pdf2xml>
"##;

fn parser() -> PdftohtmlXmlParser {
    PdftohtmlXmlParser::new().expect("parser regexes should compile")
}

#[test]
fn pdftohtml_xml_yields_pages_lines_and_blocks() {
    let pages = parser().parse(SAMPLE_XML).expect("sample xml should parse");
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].width, 612.0);
    assert_eq!(pages[0].height, 792.0);

    let block_sizes = pages[0]
        .blocks
        .iter()
        .map(|block| block.lines.len())
        .collect::<Vec<usize>>();
    assert_eq!(block_sizes, vec![1, 2, 1]);
    assert!(pages[0].blocks.iter().all(|block| block.is_text()));

    let title_line = &pages[0].blocks[0].lines[0];
    assert_eq!(title_line.spans.len(), 2);
    assert_eq!(title_line.spans[0].text, "Annual Report");
    assert_eq!(title_line.spans[0].font, "Times");
    assert_eq!(title_line.spans[0].size, 24.0);
    assert_eq!(title_line.spans[0].flags, SPAN_FLAG_BOLD);
    assert_eq!(title_line.spans[0].bbox, [180.0, 100.0, 432.0, 128.0]);
    assert_eq!(title_line.spans[1].text, "2024");

    let body = &pages[0].blocks[1];
    assert_eq!(body.lines[0].spans[0].text, "First body line & more");
    assert_eq!(body.lines[1].spans[0].text, "Second body line\u{a0}here");
    assert_eq!(body.lines[0].spans[0].flags, 0);

    let note = &pages[0].blocks[2].lines[0].spans[0];
    assert_eq!(note.text, "Note set apart");
    assert_eq!(note.flags, SPAN_FLAG_ITALIC);

    assert_eq!(pages[1].blocks.len(), 1);
    assert_eq!(pages[1].blocks[0].lines[0].spans[0].text, "Page two");
}

#[test]
fn pdftohtml_text_outside_page_is_rejected() {
    let xml = r##"<fontspec id="0" size="12" family="Times" color="#000000"/>
<text top="10" left="10" width="10" height="10" font="0">Orphan</text>"##;
    assert!(parser().parse(xml).is_err());
}

#[test]
fn pdftohtml_page_without_dimensions_is_rejected() {
    let xml = r#"<page number="1" position="absolute" top="0" left="0">"#;
    let error = parser().parse(xml).expect_err("page needs width and height");
    assert!(error.to_string().contains("missing attribute"));
}

#[test]
fn pdftohtml_geometry_feeds_classifier() {
    let pages = parser().parse(SAMPLE_XML).expect("sample xml should parse");
    let document = RawDocument {
        metadata: DocumentMetadata::default(),
        pages,
    };

    let classifier =
        OutlineClassifier::new(ClassifierConfig::default()).expect("default config should build");
    let outline = classifier
        .classify(&document)
        .expect("sample should retain lines");
    assert_eq!(outline.title, "Annual Report 2024");
    assert!(outline.outline.is_empty());
}

#[test]
fn pdfinfo_title_line_is_extracted() {
    let info = "Title:          Field Guide to Outlines\nAuthor:         Someone\nPages:          3\n";
    assert_eq!(
        parse_pdfinfo_title(info),
        Some("Field Guide to Outlines".to_string())
    );
    assert_eq!(parse_pdfinfo_title("Title:   \nPages: 3\n"), None);
    assert_eq!(parse_pdfinfo_title("Pages: 3\n"), None);
}

#[test]
fn layout_json_accepts_missing_optional_fields() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("sample.json");
    fs::write(
        &path,
        r#"{
          "pages": [
            { "width": 612, "height": 792,
              "blocks": [
                { "type": 0, "lines": [ { "spans": [
                  { "text": "Hello world", "size": 12, "bbox": [72, 100, 200, 112] } ] } ] },
                { "type": 1 }
              ] },
            { "width": 612, "height": 792 }
          ]
        }"#,
    )
    .expect("layout should be written");

    let document = load_layout_json(&path, None).expect("layout should load");
    assert!(document.metadata.title.is_none());
    assert_eq!(document.pages.len(), 2);
    assert!(!document.pages[0].blocks[1].is_text());
    assert!(document.pages[0].blocks[1].lines.is_empty());
    assert!(document.pages[1].blocks.is_empty());

    let span = &document.pages[0].blocks[0].lines[0].spans[0];
    assert_eq!(span.font, "");
    assert_eq!(span.flags, 0);

    let truncated = load_layout_json(&path, Some(1)).expect("layout should load");
    assert_eq!(truncated.pages.len(), 1);
}

#[test]
fn layout_json_parse_errors_name_the_file() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").expect("file should be written");

    let error = load_layout_json(&path, None).expect_err("broken json should fail");
    assert!(error.to_string().contains("failed to parse layout json"));
}
