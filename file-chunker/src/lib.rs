pub mod chunker;
pub mod reader_docx;
pub mod reader_excel;
pub mod reader_pdf;
pub mod reader_txt;

pub use chunker::{chunk, chunk_text, join_segments, ChunkError, ChunkParams};

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::Utc;
use chunk_model::{DocumentId, FileRecord};
use sha2::Digest;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read `{path}`: {message}")]
    Read { path: String, message: String },
}

impl ExtractError {
    pub fn read(path: &Path, err: impl fmt::Display) -> Self {
        Self::Read { path: path.display().to_string(), message: err.to_string() }
    }
}

/// File formats with an extraction adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Text,
    Pdf,
    Docx,
    Spreadsheet,
}

impl SourceFormat {
    /// Detect the format from the (case-insensitive) file extension.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "xlsx" | "xls" | "ods" => Ok(Self::Spreadsheet),
            other => Err(ExtractError::UnsupportedFormat(format!(".{other}"))),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Pdf => "application/pdf",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Spreadsheet => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Pdf => "lopdf",
            Self::Docx => "docx",
            Self::Spreadsheet => "calamine",
        }
    }
}

/// Extracted segments together with the detected format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub format: SourceFormat,
    pub segments: Vec<String>,
}

/// Extract the ordered text segments of a file, dispatching on its extension.
pub fn extract(path: &Path) -> Result<Vec<String>, ExtractError> {
    extract_with_encoding(path, None).map(|x| x.segments)
}

/// Variant with an explicit encoding hint for text files. Other formats ignore it.
pub fn extract_with_encoding(path: &Path, encoding: Option<&str>) -> Result<Extraction, ExtractError> {
    let format = SourceFormat::from_path(path)?;
    let segments = match format {
        SourceFormat::Text => reader_txt::read_txt_segments_with_encoding(path, encoding)?,
        SourceFormat::Pdf => reader_pdf::read_pdf_segments(path)?,
        SourceFormat::Docx => reader_docx::read_docx_segments(path)?,
        SourceFormat::Spreadsheet => reader_excel::read_excel_segments(path)?,
    };
    tracing::debug!(path = %path.display(), backend = format.backend(), segments = segments.len(), "extracted");
    Ok(Extraction { format, segments })
}

/// Build the registry record for an extracted file: size and SHA-256 of the
/// content, extraction time, and the backend used.
pub fn file_record_for(path: &Path, doc_id: DocumentId, extraction: &Extraction) -> FileRecord {
    let mut file = FileRecord {
        doc_id,
        source_uri: path.display().to_string(),
        source_mime: extraction.format.mime().into(),
        file_size_bytes: None,
        content_sha256: None,
        extracted_at: Utc::now().to_rfc3339(),
        reader_backend: Some(extraction.format.backend().into()),
        segment_count: extraction.segments.len() as u32,
        chunk_count: 0,
    };
    if let Ok(md) = std::fs::metadata(path) {
        file.file_size_bytes = Some(md.len());
    }
    file.content_sha256 = compute_sha256_hex(path);
    file
}

fn compute_sha256_hex(path: &Path) -> Option<String> {
    let f = File::open(path).ok()?;
    let mut reader = BufReader::new(f);
    let mut hasher = sha2::Sha256::new();
    let mut buf = [0u8; 32 * 1024];
    loop {
        let n = reader.read(&mut buf).ok()?;
        if n == 0 { break; }
        hasher.update(&buf[..n]);
    }
    Some(hex::encode(hasher.finalize()))
}

