pub mod chunk_store;
pub mod orchestrator;
pub mod vector_index;

pub use chunk_store::ChunkStore;
pub use orchestrator::{EvictReport, IndexState, IndexedCorpus, OrchestratorError};
pub use vector_index::{IndexError, VectorIndex};

use chunk_model::ChunkRecord;

/// A retrieved chunk and its squared Euclidean distance to the query (smaller is closer).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk: ChunkRecord,
    pub distance: f32,
}
