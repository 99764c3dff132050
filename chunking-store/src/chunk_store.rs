use chunk_model::{ChunkRecord, DocumentId};

/// Ordered, append-only collection of chunk records.
///
/// A record's position here is its row in the paired vector index, so the
/// store only grows at the end and only shrinks by whole documents. Writes
/// go through [`crate::orchestrator::IndexedCorpus`].
#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    records: Vec<ChunkRecord>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, records: Vec<ChunkRecord>) {
        self.records.extend(records);
    }

    /// Drops every record of `doc` and returns the survivors in their original order.
    pub(crate) fn remove_by_document(&mut self, doc: &DocumentId) -> Vec<ChunkRecord> {
        self.records.retain(|r| &r.source_document != doc);
        self.records.clone()
    }

    /// Records that would survive removing `doc`, without touching the store.
    pub fn survivors_of(&self, doc: &DocumentId) -> Vec<&ChunkRecord> {
        self.records.iter().filter(|r| &r.source_document != doc).collect()
    }

    /// All records in storage order.
    pub fn all(&self) -> &[ChunkRecord] {
        &self.records
    }

    pub fn get(&self, position: usize) -> Option<&ChunkRecord> {
        self.records.get(position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count_for(&self, doc: &DocumentId) -> usize {
        self.records.iter().filter(|r| &r.source_document == doc).count()
    }
}
