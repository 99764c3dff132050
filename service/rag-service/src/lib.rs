pub mod history;
pub mod registry;

use std::path::Path;
use std::sync::{Arc, RwLock};

use chunk_model::{ChunkRecord, DocumentId, FileRecord};
use chunking_store::{EvictReport, IndexState, IndexedCorpus, OrchestratorError, SearchHit};
use embedding_provider::config::default_stdio_config;
use embedding_provider::embedder::{
    Embedder, HashingConfig, HashingEmbedder, OnnxStdIoConfig, OnnxStdIoEmbedder,
};
use file_chunker::{chunk_text, join_segments, ChunkParams, ExtractError};
use generation_provider::config::GeminiConfig;
use generation_provider::generator::{GeminiGenerator, Generator};

pub use history::ChatHistory;
pub use registry::DocumentRegistry;

/// Answer returned when retrieval finds nothing.
pub const NO_DOCUMENTS_ANSWER: &str = "No relevant documents found for your query.";
/// Answer returned when generation fails or no generator is configured.
pub const GENERATION_FAILED_ANSWER: &str = "Sorry, I couldn't generate a response.";
pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("chunking error: {0}")]
    Chunking(String),
    #[error("extract error: {0}")]
    Extract(String),
    #[error("embedder error: {0}")]
    Embed(String),
    #[error("index error: {0}")]
    Index(String),
    #[error("generator error: {0}")]
    Generation(String),
}

impl From<OrchestratorError> for ServiceError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Embed(msg) => ServiceError::Embed(msg),
            other => ServiceError::Index(other.to_string()),
        }
    }
}

/// Which embedding backend the service loads.
#[derive(Debug, Clone)]
pub enum EmbedderConfig {
    OnnxStdIo(OnnxStdIoConfig),
    Hashing(HashingConfig),
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub chunk: ChunkParams,
    /// Chunks retrieved per question.
    pub top_k: usize,
    /// Max number of chunks to embed per batch to control memory usage.
    pub embed_batch_size: usize,
    pub embedder: EmbedderConfig,
    /// Answer generation is disabled when `None`.
    pub generator: Option<GeminiConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            chunk: ChunkParams::default(),
            top_k: DEFAULT_TOP_K,
            embed_batch_size: 64,
            embedder: EmbedderConfig::OnnxStdIo(default_stdio_config()),
            generator: None,
        }
    }
}

/// Progress events emitted during ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Start { total_chunks: usize },
    EmbedBatch { done: usize, total: usize, batch: usize },
    IndexVector { total: usize },
    Finished { total: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub document_id: DocumentId,
    pub chunks_added: usize,
    /// Chunks held by the session after this ingest.
    pub total_chunks: usize,
}

/// Result of ingesting a file from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileIngest {
    Ingested(IngestReport),
    /// The file type has no extractor; nothing was changed.
    Skipped { document_id: DocumentId, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Chunks the answer was grounded on, nearest first.
    pub sources: Vec<ChunkRecord>,
}

/// One question-answering session: the indexed corpus, its document
/// registry, chat history, and the models used to embed and answer.
pub struct RagService {
    cfg: ServiceConfig,
    embedder: Box<dyn Embedder>,
    generator: Option<Box<dyn Generator>>,
    corpus: IndexedCorpus,
    registry: DocumentRegistry,
    history: ChatHistory,
}

impl RagService {
    /// Load the configured embedder (and generator, if any).
    pub fn new(cfg: ServiceConfig) -> Result<Self, ServiceError> {
        let embedder: Box<dyn Embedder> = match &cfg.embedder {
            EmbedderConfig::OnnxStdIo(c) => {
                Box::new(OnnxStdIoEmbedder::new(c.clone()).map_err(|e| ServiceError::Embed(e.to_string()))?)
            }
            EmbedderConfig::Hashing(c) => {
                Box::new(HashingEmbedder::new(c.clone()).map_err(|e| ServiceError::Embed(e.to_string()))?)
            }
        };
        let generator: Option<Box<dyn Generator>> = match &cfg.generator {
            Some(c) => Some(Box::new(
                GeminiGenerator::new(c.clone()).map_err(|e| ServiceError::Generation(e.to_string()))?,
            )),
            None => None,
        };
        Self::with_components(cfg, embedder, generator)
    }

    /// Build a service around already constructed models.
    pub fn with_components(
        cfg: ServiceConfig,
        embedder: Box<dyn Embedder>,
        generator: Option<Box<dyn Generator>>,
    ) -> Result<Self, ServiceError> {
        cfg.chunk.validate().map_err(|e| ServiceError::Chunking(e.to_string()))?;
        let dim = embedder.info().dimension;
        tracing::info!(
            model = %embedder.info().embedding_model_id,
            dim,
            chunk_size = cfg.chunk.chunk_size,
            overlap = cfg.chunk.overlap,
            generator = generator.is_some(),
            "rag service ready"
        );
        Ok(Self {
            cfg,
            embedder,
            generator,
            corpus: IndexedCorpus::new(dim),
            registry: DocumentRegistry::new(),
            history: ChatHistory::new(),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.cfg
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Chunk and index the extracted segments of one document.
    pub fn ingest(&mut self, document_id: &DocumentId, segments: &[String]) -> Result<IngestReport, ServiceError> {
        self.ingest_with_progress(document_id, segments, None)
    }

    /// Segments are joined with single spaces and chunked as one string, so
    /// chunks may span page or paragraph boundaries. Store and index change
    /// only once every chunk has been embedded.
    pub fn ingest_with_progress(
        &mut self,
        document_id: &DocumentId,
        segments: &[String],
        mut progress: Option<&mut dyn FnMut(ProgressEvent)>,
    ) -> Result<IngestReport, ServiceError> {
        let joined = join_segments(segments);
        let records: Vec<ChunkRecord> = chunk_text(&joined, &self.cfg.chunk)
            .map_err(|e| ServiceError::Chunking(e.to_string()))?
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| ChunkRecord::new(c, document_id.clone()))
            .collect();

        if let Some(cb) = progress.as_deref_mut() { cb(ProgressEvent::Start { total_chunks: records.len() }); }

        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let cb_opt = progress.as_mut().map(|b| &mut **b as &mut dyn FnMut(ProgressEvent));
        let vecs = embed_in_batches(self.embedder.as_ref(), &texts, self.cfg.embed_batch_size, cb_opt)?;

        let added = self.corpus.ingest(records, &vecs)?;
        if let Some(cb) = progress.as_deref_mut() { cb(ProgressEvent::IndexVector { total: added }); }

        self.registry.register_inline(document_id, added);
        if let Some(cb) = progress.as_deref_mut() { cb(ProgressEvent::Finished { total: added }); }

        let total_chunks = self.corpus.store().len();
        tracing::info!(doc = %document_id, added, total_chunks, "document ingested");
        Ok(IngestReport { document_id: document_id.clone(), chunks_added: added, total_chunks })
    }

    /// Extract a file by extension and ingest it under its file name.
    pub fn ingest_file(&mut self, path: &Path) -> Result<FileIngest, ServiceError> {
        self.ingest_file_with_encoding(path, None)
    }

    /// Variant of [`Self::ingest_file`] with an encoding hint for text files.
    pub fn ingest_file_with_encoding(&mut self, path: &Path, encoding: Option<&str>) -> Result<FileIngest, ServiceError> {
        let document_id = document_id_for(path);
        let extraction = match file_chunker::extract_with_encoding(path, encoding) {
            Ok(x) => x,
            Err(ExtractError::UnsupportedFormat(ext)) => {
                tracing::warn!(path = %path.display(), ext = %ext, "unsupported file type; skipped");
                return Ok(FileIngest::Skipped { document_id, reason: format!("unsupported file type: {ext}") });
            }
            Err(e) => return Err(ServiceError::Extract(e.to_string())),
        };

        let file: FileRecord = file_chunker::file_record_for(path, document_id.clone(), &extraction);
        let report = self.ingest(&document_id, &extraction.segments)?;
        // Replace the inline record; the chunk count accumulated by `ingest` is kept.
        self.registry.register(file, 0);
        Ok(FileIngest::Ingested(report))
    }

    /// Drop every chunk of `document_id` and rebuild the index from the rest.
    ///
    /// The surviving chunks are re-embedded before anything changes, so a
    /// failure leaves the session as it was. Unknown ids are a no-op.
    pub fn evict(&mut self, document_id: &DocumentId) -> Result<EvictReport, ServiceError> {
        let embedder = self.embedder.as_ref();
        let batch = self.cfg.embed_batch_size;
        let report = self
            .corpus
            .evict(document_id, |texts| {
                embed_in_batches(embedder, texts, batch, None).map_err(|e| match e {
                    ServiceError::Embed(msg) => msg,
                    other => other.to_string(),
                })
            })?;
        let known = self.registry.remove(document_id).is_some();
        if known || report.removed > 0 {
            tracing::info!(doc = %document_id, removed = report.removed, remaining = report.remaining, "document evicted");
        }
        Ok(report)
    }

    /// The `top_k` chunks nearest to `query`, nearest first.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ChunkRecord>, ServiceError> {
        Ok(self.retrieve_scored(query, top_k)?.into_iter().map(|h| h.chunk).collect())
    }

    pub fn retrieve_scored(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, ServiceError> {
        if self.corpus.store().is_empty() || self.corpus.state() == IndexState::Absent {
            return Ok(Vec::new());
        }
        let qv = self.embedder.embed(query).map_err(|e| ServiceError::Embed(e.to_string()))?;
        Ok(self.corpus.search(&qv, top_k)?)
    }

    /// Retrieve context for `query`, ask the generator, and save the turn.
    pub fn answer(&mut self, query: &str) -> Result<Answer, ServiceError> {
        let sources = self.retrieve(query, self.cfg.top_k)?;
        let text = if sources.is_empty() {
            NO_DOCUMENTS_ANSWER.to_string()
        } else {
            self.generate(query, &sources)
        };
        self.history.save(query, text.clone());
        Ok(Answer { text, sources })
    }

    fn generate(&self, query: &str, sources: &[ChunkRecord]) -> String {
        let Some(generator) = self.generator.as_ref() else {
            tracing::warn!("no generator configured");
            return GENERATION_FAILED_ANSWER.to_string();
        };
        let context: Vec<&str> = sources.iter().map(|c| c.text.as_str()).collect();
        match generator.generate(query, &context, self.history.turns()) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "generation failed");
                GENERATION_FAILED_ANSWER.to_string()
            }
        }
    }

    pub fn index_state(&self) -> IndexState {
        self.corpus.state()
    }

    pub fn chunk_count(&self) -> usize {
        self.corpus.store().len()
    }

    pub fn chunks(&self) -> &[ChunkRecord] {
        self.corpus.store().all()
    }

    pub fn documents(&self) -> Vec<DocumentId> {
        self.registry.ids()
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut ChatHistory {
        &mut self.history
    }
}

/// File name of `path`, used as its document id.
pub fn document_id_for(path: &Path) -> DocumentId {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
        .into()
}

/// Embed texts in batches of `batch_size` to limit memory spikes.
fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[&str],
    batch_size: usize,
    mut progress: Option<&mut dyn FnMut(ProgressEvent)>,
) -> Result<Vec<Vec<f32>>, ServiceError> {
    if texts.is_empty() { return Ok(Vec::new()); }
    let bsz = batch_size.max(1);
    let mut out: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
    let mut done = 0usize;
    for chunk in texts.chunks(bsz) {
        let vecs = embedder.embed_batch(chunk).map_err(|e| ServiceError::Embed(e.to_string()))?;
        out.extend(vecs);
        done += chunk.len();
        if let Some(cb) = progress.as_deref_mut() { cb(ProgressEvent::EmbedBatch { done, total: texts.len(), batch: chunk.len() }); }
    }
    Ok(out)
}

/// [`RagService`] behind a reader-writer lock: retrievals may run together,
/// ingest and evict run alone.
#[derive(Clone)]
pub struct SharedRagService {
    inner: Arc<RwLock<RagService>>,
}

impl SharedRagService {
    pub fn new(service: RagService) -> Self {
        Self { inner: Arc::new(RwLock::new(service)) }
    }

    pub fn read<R>(&self, f: impl FnOnce(&RagService) -> R) -> Result<R, ServiceError> {
        let guard = self.inner.read().map_err(|_| ServiceError::Index("service lock poisoned".into()))?;
        Ok(f(&guard))
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut RagService) -> R) -> Result<R, ServiceError> {
        let mut guard = self.inner.write().map_err(|_| ServiceError::Index("service lock poisoned".into()))?;
        Ok(f(&mut guard))
    }

    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ChunkRecord>, ServiceError> {
        self.read(|svc| svc.retrieve(query, top_k))?
    }

    pub fn ingest(&self, document_id: &DocumentId, segments: &[String]) -> Result<IngestReport, ServiceError> {
        self.write(|svc| svc.ingest(document_id, segments))?
    }

    pub fn ingest_file(&self, path: &Path) -> Result<FileIngest, ServiceError> {
        self.write(|svc| svc.ingest_file(path))?
    }

    pub fn evict(&self, document_id: &DocumentId) -> Result<EvictReport, ServiceError> {
        self.write(|svc| svc.evict(document_id))?
    }

    pub fn answer(&self, query: &str) -> Result<Answer, ServiceError> {
        self.write(|svc| svc.answer(query))?
    }
}
