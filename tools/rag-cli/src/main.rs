use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chunk_model::DocumentId;
use clap::{Args, Parser, Subcommand, ValueEnum};
use embedding_provider::config::{default_hashing_config, default_stdio_config};
use file_chunker::chunker::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use file_chunker::{chunk_text, extract_with_encoding, join_segments, ChunkParams};
use generation_provider::config::GeminiConfig;
use rag_service::{EmbedderConfig, FileIngest, RagService, ServiceConfig, DEFAULT_TOP_K};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rag-cli", about = "Index documents and ask questions about them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a file and print its chunks.
    Chunk {
        file: PathBuf,
        #[command(flatten)]
        chunking: ChunkArgs,
        /// Encoding of text files (utf-8, shift_jis, windows-1252, utf-16le, utf-16be).
        #[arg(long)]
        encoding: Option<String>,
    },
    /// Index files and print the chunks nearest to a query.
    Search {
        query: String,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Index files and answer a question with Gemini.
    Ask {
        query: String,
        #[command(flatten)]
        session: SessionArgs,
        /// Gemini API key.
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: String,
        /// Gemini model name.
        #[arg(long)]
        model: Option<String>,
        /// Write the chat transcript here.
        #[arg(long)]
        export_chat: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
struct ChunkArgs {
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    #[arg(long, default_value_t = DEFAULT_OVERLAP)]
    overlap: usize,
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Files to index (.txt, .pdf, .docx, .xlsx).
    #[arg(long = "file", short = 'f', required = true)]
    files: Vec<PathBuf>,
    /// Document ids (file names) to evict after indexing.
    #[arg(long)]
    evict: Vec<String>,
    #[arg(long, short = 'k', default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
    #[command(flatten)]
    chunking: ChunkArgs,
    #[command(flatten)]
    embedder: EmbedderArgs,
    /// Write the indexed document list here.
    #[arg(long)]
    export_docs: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum EmbedderKind {
    /// Local ONNX sentence-embedding model.
    Onnx,
    /// Model-free token hashing.
    Hashing,
}

#[derive(Args, Debug)]
struct EmbedderArgs {
    #[arg(long, value_enum, default_value_t = EmbedderKind::Onnx)]
    embedder: EmbedderKind,
    #[arg(long)]
    model_path: Option<PathBuf>,
    #[arg(long)]
    tokenizer: Option<PathBuf>,
    #[arg(long)]
    runtime: Option<PathBuf>,
    #[arg(long)]
    dim: Option<usize>,
    #[arg(long)]
    max_tokens: Option<usize>,
    #[arg(long, default_value_t = 64)]
    embed_batch: usize,
}

impl ChunkArgs {
    fn params(&self) -> Result<ChunkParams> {
        Ok(ChunkParams::new(self.chunk_size, self.overlap)?)
    }
}

impl EmbedderArgs {
    fn config(&self) -> EmbedderConfig {
        match self.embedder {
            EmbedderKind::Onnx => {
                let mut cfg = default_stdio_config();
                if let Some(p) = &self.model_path { cfg.model_path = p.clone(); }
                if let Some(p) = &self.tokenizer { cfg.tokenizer_path = p.clone(); }
                if let Some(p) = &self.runtime { cfg.runtime_library_path = p.clone(); }
                if let Some(d) = self.dim { cfg.dimension = d; }
                if let Some(m) = self.max_tokens { cfg.max_input_length = m; }
                EmbedderConfig::OnnxStdIo(cfg)
            }
            EmbedderKind::Hashing => {
                let mut cfg = default_hashing_config();
                if let Some(d) = self.dim { cfg.dimension = d; }
                EmbedderConfig::Hashing(cfg)
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rag_service=info,rag_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Chunk { file, chunking, encoding } => run_chunk(file, chunking, encoding),
        Command::Search { query, session } => run_search(&query, session),
        Command::Ask { query, session, api_key, model, export_chat } => {
            let mut gemini = GeminiConfig::with_api_key(api_key);
            if let Some(m) = model { gemini.model = m; }
            run_ask(&query, session, gemini, export_chat)
        }
    }
}

fn run_chunk(file: PathBuf, chunking: ChunkArgs, encoding: Option<String>) -> Result<()> {
    let extraction = extract_with_encoding(&file, encoding.as_deref())
        .with_context(|| format!("extracting {}", file.display()))?;
    let chunks = chunk_text(&join_segments(&extraction.segments), &chunking.params()?)?;
    println!("{}: {} segments, {} chunks", file.display(), extraction.segments.len(), chunks.len());
    for (i, c) in chunks.iter().enumerate() {
        println!("--- [{}] {} chars", i, c.chars().count());
        println!("{c}");
    }
    Ok(())
}

fn run_search(query: &str, session: SessionArgs) -> Result<()> {
    let (svc, top_k) = open_session(session, None)?;
    let hits = svc.retrieve_scored(query, top_k)?;
    println!("Results: {}", hits.len());
    for (i, h) in hits.iter().enumerate() {
        let preview: String = h.chunk.text.chars().take(80).collect();
        println!("{:>2}. [{}] {:.4} {}", i + 1, h.chunk.source_document, h.distance, preview);
    }
    Ok(())
}

fn run_ask(query: &str, session: SessionArgs, gemini: GeminiConfig, export_chat: Option<PathBuf>) -> Result<()> {
    let (mut svc, _) = open_session(session, Some(gemini))?;
    let answer = svc.answer(query)?;
    println!("{}", answer.text);
    if !answer.sources.is_empty() {
        println!();
        println!("Sources:");
        for s in &answer.sources {
            let preview: String = s.text.chars().take(60).collect();
            println!("  - {} ({}): {}", s.source_document, s.source_document.extension_label(), preview);
        }
    }
    if let Some(path) = export_chat {
        fs::write(&path, svc.history().export()).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

/// Build the service, ingest every file, then apply evictions.
fn open_session(session: SessionArgs, generator: Option<GeminiConfig>) -> Result<(RagService, usize)> {
    if session.top_k == 0 {
        bail!("--top-k must be at least 1");
    }
    let cfg = ServiceConfig {
        chunk: session.chunking.params()?,
        top_k: session.top_k,
        embed_batch_size: session.embedder.embed_batch,
        embedder: session.embedder.config(),
        generator,
    };
    let mut svc = RagService::new(cfg).context("starting service")?;

    for file in &session.files {
        match svc.ingest_file(file)? {
            FileIngest::Ingested(report) => {
                tracing::info!(document = %report.document_id, chunks = report.chunks_added, "indexed")
            }
            FileIngest::Skipped { document_id, reason } => {
                tracing::warn!(document = %document_id, %reason, "skipped")
            }
        }
    }

    for doc in &session.evict {
        let report = svc.evict(&DocumentId::from(doc.as_str()))?;
        tracing::info!(document = %doc, removed = report.removed, remaining = report.remaining, "evicted");
    }

    if let Some(path) = &session.export_docs {
        fs::write(path, svc.registry().export()).with_context(|| format!("writing {}", path.display()))?;
    }
    let top_k = svc.config().top_k;
    Ok((svc, top_k))
}
