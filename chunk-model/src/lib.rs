//! Shared models used across crates

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a source document (the uploaded file name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-cased extension, e.g. `PDF` for `report.pdf`. Empty when the id has none.
    pub fn extension_label(&self) -> String {
        match self.0.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_uppercase(),
            None => String::new(),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single chunk of text derived from a source document.
///
/// The record carries no explicit position: its index in the chunk store is
/// also its row in the vector index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Text content of the chunk.
    pub text: String,
    /// Document this chunk was cut from.
    pub source_document: DocumentId,
}

impl ChunkRecord {
    pub fn new(text: impl Into<String>, source_document: DocumentId) -> Self {
        Self { text: text.into(), source_document }
    }
}

/// File-level metadata kept for each registered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub doc_id: DocumentId,
    /// Path or URI the document was read from.
    pub source_uri: String,
    /// MIME-like content type (e.g., "application/pdf").
    pub source_mime: String,
    pub file_size_bytes: Option<u64>,
    pub content_sha256: Option<String>,
    /// RFC 3339 timestamp of the (latest) extraction.
    pub extracted_at: String,
    /// Extraction backend that produced the segments (e.g. "txt", "docx").
    pub reader_backend: Option<String>,
    /// Number of segments the extractor returned.
    pub segment_count: u32,
    /// Cumulative number of chunks this document contributed.
    pub chunk_count: u32,
}

impl FileRecord {
    /// Minimal record for text handed in directly rather than read from a file.
    pub fn inline(doc_id: DocumentId) -> Self {
        Self {
            source_uri: format!("user://{}", doc_id.0),
            doc_id,
            source_mime: "text/plain".into(),
            file_size_bytes: None,
            content_sha256: None,
            extracted_at: String::new(),
            reader_backend: None,
            segment_count: 0,
            chunk_count: 0,
        }
    }
}
