use std::fs;
use std::io::Write;
use std::path::Path;

use chunk_model::DocumentId;
use file_chunker::reader_docx::parse_document_xml;
use file_chunker::{extract, extract_with_encoding, file_record_for, ExtractError, SourceFormat};
use tempfile::tempdir;

fn write_docx(path: &Path, body: &str) {
    let file = fs::File::create(path).expect("create docx");
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("word/document.xml", zip::write::FileOptions::default())
        .expect("start entry");
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    zip.write_all(xml.as_bytes()).expect("write entry");
    zip.finish().expect("finish zip");
}

#[test]
fn txt_lines_are_trimmed_and_blank_lines_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "  first line \n\n second\r\nthird  \n   \n").unwrap();

    let segments = extract(&path).expect("txt extraction");
    assert_eq!(segments, vec!["first line", "second", "third"]);
}

#[test]
fn txt_honours_encoding_hint() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sjis.TXT");
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("こんにちは\n世界");
    fs::write(&path, &bytes).unwrap();

    let out = extract_with_encoding(&path, Some("cp932")).expect("sjis extraction");
    assert_eq!(out.format, SourceFormat::Text);
    assert_eq!(out.segments, vec!["こんにちは", "世界"]);
}

#[test]
fn docx_paragraphs_become_segments() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.docx");
    write_docx(
        &path,
        "<w:p><w:r><w:t>Quarterly </w:t></w:r><w:r><w:t>report</w:t></w:r></w:p>\
         <w:p></w:p><w:p/>\
         <w:p><w:r><w:t xml:space=\"preserve\">  Revenue &amp; costs  </w:t></w:r></w:p>",
    );

    let segments = extract(&path).expect("docx extraction");
    assert_eq!(segments, vec!["Quarterly report", "Revenue & costs"]);
}

#[test]
fn docx_tabs_and_breaks_are_kept_inside_a_paragraph() {
    let xml = "<w:document xmlns:w=\"x\"><w:body><w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p></w:body></w:document>";
    let segments = parse_document_xml(xml).expect("parse");
    assert_eq!(segments, vec!["a\tb\nc"]);
}

#[test]
fn invalid_docx_is_a_read_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.docx");
    fs::write(&path, b"definitely not a zip").unwrap();
    assert!(matches!(extract(&path), Err(ExtractError::Read { .. })));
}

#[test]
fn spreadsheet_cells_are_read_column_by_column_after_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("table.xlsx");
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Name").unwrap();
    sheet.write_string(0, 1, "Note").unwrap();
    sheet.write_string(1, 0, "alpha").unwrap();
    sheet.write_string(1, 1, " first ").unwrap();
    sheet.write_string(2, 0, "beta").unwrap();
    sheet.write_number(3, 1, 42.0).unwrap();
    workbook.save(&path).unwrap();

    let segments = extract(&path).expect("xlsx extraction");
    assert_eq!(segments, vec!["alpha", "beta", "first", "42"]);
}

#[test]
fn unknown_extension_is_unsupported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("slides.pptx");
    fs::write(&path, b"whatever").unwrap();
    assert_eq!(extract(&path), Err(ExtractError::UnsupportedFormat(".pptx".into())));

    let bare = dir.path().join("README");
    assert_eq!(
        SourceFormat::from_path(&bare),
        Err(ExtractError::UnsupportedFormat(".".into()))
    );
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gone.txt");
    assert!(matches!(extract(&path), Err(ExtractError::Read { .. })));
}

#[test]
fn file_record_carries_size_and_digest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hello.txt");
    fs::write(&path, "hello").unwrap();

    let extraction = extract_with_encoding(&path, None).unwrap();
    let record = file_record_for(&path, DocumentId::new("hello.txt"), &extraction);
    assert_eq!(record.doc_id.as_str(), "hello.txt");
    assert_eq!(record.source_mime, "text/plain");
    assert_eq!(record.file_size_bytes, Some(5));
    assert_eq!(
        record.content_sha256.as_deref(),
        Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
    );
    assert_eq!(record.segment_count, 1);
    assert_eq!(record.chunk_count, 0);
    assert!(!record.extracted_at.is_empty());
}
