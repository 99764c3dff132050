use chrono::Utc;
use chunk_model::{DocumentId, FileRecord};

/// Documents known to the session, in the order they were first ingested.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    files: Vec<FileRecord>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `file` or, if its id is already known, refresh the stored record
    /// and add `chunks` to its running chunk count.
    pub fn register(&mut self, mut file: FileRecord, chunks: usize) {
        match self.files.iter_mut().find(|f| f.doc_id == file.doc_id) {
            Some(existing) => {
                file.chunk_count = existing.chunk_count + chunks as u32;
                *existing = file;
            }
            None => {
                file.chunk_count = chunks as u32;
                self.files.push(file);
            }
        }
    }

    /// Register a document that did not come from a file.
    pub fn register_inline(&mut self, doc_id: &DocumentId, chunks: usize) {
        let mut file = match self.get(doc_id) {
            Some(existing) => existing.clone(),
            None => FileRecord::inline(doc_id.clone()),
        };
        file.extracted_at = Utc::now().to_rfc3339();
        self.register(file, chunks);
    }

    pub fn remove(&mut self, doc_id: &DocumentId) -> Option<FileRecord> {
        let pos = self.files.iter().position(|f| &f.doc_id == doc_id)?;
        Some(self.files.remove(pos))
    }

    pub fn contains(&self, doc_id: &DocumentId) -> bool {
        self.get(doc_id).is_some()
    }

    pub fn get(&self, doc_id: &DocumentId) -> Option<&FileRecord> {
        self.files.iter().find(|f| &f.doc_id == doc_id)
    }

    pub fn ids(&self) -> Vec<DocumentId> {
        self.files.iter().map(|f| f.doc_id.clone()).collect()
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// One id per line.
    pub fn export(&self) -> String {
        self.files.iter().map(|f| f.doc_id.as_str()).collect::<Vec<_>>().join("\n")
    }
}
