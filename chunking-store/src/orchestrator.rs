use std::fmt;

use chunk_model::{ChunkRecord, DocumentId};

use crate::chunk_store::ChunkStore;
use crate::vector_index::{IndexError, VectorIndex};
use crate::SearchHit;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("index error: {0}")]
    Index(#[from] IndexError),
    #[error("got {vectors} vectors for {records} records")]
    LengthMismatch { records: usize, vectors: usize },
    #[error("embedding failed: {0}")]
    Embed(String),
}

/// Observable state of the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// No index exists: every document was evicted. The next ingest builds one.
    Absent,
    Ready { rows: usize },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvictReport {
    pub removed: usize,
    pub remaining: usize,
}

/// Chunk store and vector index kept in lock-step: row `i` of the index is
/// the embedding of record `i` of the store.
///
/// This is the only writer of either. Every operation validates and builds
/// what it needs first and mutates last, so a failed call changes nothing.
#[derive(Debug, Clone)]
pub struct IndexedCorpus {
    dim: usize,
    store: ChunkStore,
    index: Option<VectorIndex>,
}

impl IndexedCorpus {
    /// Empty corpus with a zero-row (Ready) index of dimension `dim`.
    pub fn new(dim: usize) -> Self {
        Self { dim, store: ChunkStore::new(), index: Some(VectorIndex::new(dim)) }
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    pub fn state(&self) -> IndexState {
        match &self.index {
            Some(index) => IndexState::Ready { rows: index.len() },
            None => IndexState::Absent,
        }
    }

    /// Append `records` and their embeddings together.
    pub fn ingest(&mut self, records: Vec<ChunkRecord>, vectors: &[Vec<f32>]) -> Result<usize, OrchestratorError> {
        if records.len() != vectors.len() {
            return Err(OrchestratorError::LengthMismatch { records: records.len(), vectors: vectors.len() });
        }
        if records.is_empty() {
            return Ok(0);
        }

        match self.index.as_mut() {
            Some(index) => index.append(vectors)?,
            None => {
                let mut fresh = VectorIndex::new(self.dim);
                fresh.append(vectors)?;
                tracing::debug!(dim = self.dim, "vector index recreated");
                self.index = Some(fresh);
            }
        }

        let added = records.len();
        self.store.append(records);
        tracing::debug!(added, total = self.store.len(), "chunks ingested");
        Ok(added)
    }

    /// Remove every chunk of `doc` and rebuild the index from the survivors.
    ///
    /// `embed` is called once with the surviving texts in storage order; it is
    /// not called when `doc` has no chunks or nothing survives. The store and
    /// index are only touched after it succeeded and the new index is built.
    pub fn evict<F, E>(&mut self, doc: &DocumentId, embed: F) -> Result<EvictReport, OrchestratorError>
    where
        F: FnOnce(&[&str]) -> Result<Vec<Vec<f32>>, E>,
        E: fmt::Display,
    {
        let removed = self.store.count_for(doc);
        if removed == 0 {
            return Ok(EvictReport { removed: 0, remaining: self.store.len() });
        }

        let survivors = self.store.survivors_of(doc);
        if survivors.is_empty() {
            self.store.remove_by_document(doc);
            self.index = None;
            tracing::debug!(doc = %doc, removed, "store emptied; index absent");
            return Ok(EvictReport { removed, remaining: 0 });
        }

        let texts: Vec<&str> = survivors.iter().map(|r| r.text.as_str()).collect();
        let vectors = embed(&texts).map_err(|e| OrchestratorError::Embed(e.to_string()))?;
        if vectors.len() != texts.len() {
            return Err(OrchestratorError::LengthMismatch { records: texts.len(), vectors: vectors.len() });
        }
        let rebuilt = match &self.index {
            Some(index) => index.rebuild(&vectors)?,
            None => {
                let mut fresh = VectorIndex::new(self.dim);
                fresh.append(&vectors)?;
                fresh
            }
        };

        let remaining = self.store.remove_by_document(doc).len();
        self.index = Some(rebuilt);
        tracing::debug!(doc = %doc, removed, remaining, "index rebuilt");
        Ok(EvictReport { removed, remaining })
    }

    /// Nearest chunks to `query`, closest first. Empty when there is nothing indexed.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, OrchestratorError> {
        let index = match &self.index {
            Some(index) if !self.store.is_empty() => index,
            _ => return Ok(Vec::new()),
        };
        let hits = index
            .search(query, top_k)?
            .into_iter()
            // A stale index may hold rows past the end of the store; drop them.
            .filter_map(|(row, distance)| {
                self.store.get(row).map(|chunk| SearchHit { chunk: chunk.clone(), distance })
            })
            .collect();
        Ok(hits)
    }
}
