use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::ExtractError;

fn local_name(q: &[u8]) -> &[u8] {
    match q.iter().position(|&b| b == b':') { Some(i) => &q[i + 1..], None => q }
}

/// Minimal DOCX reader: opens the zip, parses word/document.xml and returns
/// the trimmed text of every non-empty paragraph.
pub fn read_docx_segments(path: &Path) -> Result<Vec<String>, ExtractError> {
    let file = File::open(path).map_err(|e| ExtractError::read(path, e))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| ExtractError::read(path, format!("not a valid .docx (zip) file: {e}")))?;
    let mut doc_xml = String::new();
    zip.by_name("word/document.xml")
        .map_err(|e| ExtractError::read(path, format!("missing word/document.xml: {e}")))?
        .read_to_string(&mut doc_xml)
        .map_err(|e| ExtractError::read(path, e))?;
    parse_document_xml(&doc_xml).map_err(|e| ExtractError::read(path, e))
}

/// Paragraph texts of a `word/document.xml` body.
pub fn parse_document_xml(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();

    let mut out = Vec::new();
    let mut cur_text = String::new();
    let mut in_p = false;
    let mut in_t = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"p" => { in_p = true; cur_text.clear(); }
                b"t" => in_t = true,
                _ => push_inline_break(&e, &mut cur_text),
            },
            Event::Empty(e) => {
                // Self-closing <w:p/> is an empty paragraph and never opens one.
                push_inline_break(&e, &mut cur_text);
            }
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"t" => in_t = false,
                b"p" if in_p => {
                    let text = cur_text.trim();
                    if !text.is_empty() {
                        out.push(text.to_string());
                    }
                    in_p = false;
                    cur_text.clear();
                }
                _ => {}
            },
            Event::Text(t) if in_t => {
                cur_text.push_str(&t.unescape()?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

fn push_inline_break(e: &BytesStart<'_>, cur_text: &mut String) {
    match local_name(e.name().as_ref()) {
        b"br" | b"cr" => cur_text.push('\n'),
        b"tab" => cur_text.push('\t'),
        _ => {}
    }
}
