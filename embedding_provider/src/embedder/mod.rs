use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use ndarray::Array2;
use ort::{Error as OrtError, session::Session, value::Tensor};
use thiserror::Error;
use tokenizers::{Encoding, Tokenizer, TruncationParams};

/// Identifies the backing implementation that powers an embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OnnxStdIo,
    Hashing,
}

/// Static metadata describing a particular embedder instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedderInfo {
    pub provider: ProviderKind,
    pub embedding_model_id: String,
    pub dimension: usize,
}

/// Errors that can be produced by embedder operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbedderError {
    #[error("invalid embedder configuration: {message}")]
    InvalidConfiguration { message: String },
    #[error("input text exceeds max length of {max_length} tokens, actual length: {actual_length}")]
    InputTooLong {
        max_length: usize,
        actual_length: usize,
    },
    #[error("provider failure: {message}")]
    ProviderFailure { message: String },
}

/// Core interface for all embedder implementations.
///
/// Every vector returned by one instance has length `info().dimension`.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;
    fn info(&self) -> &EmbedderInfo;

    fn dimension(&self) -> usize {
        self.info().dimension
    }
}

/// Configuration for a local ONNX sentence-embedding model.
#[derive(Debug, Clone)]
pub struct OnnxStdIoConfig {
    pub model_path: PathBuf,
    pub runtime_library_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub dimension: usize,
    pub max_input_length: usize,
    pub embedding_model_id: String,
    /// Token used to right-pad batches.
    pub pad_token: String,
    /// Cut inputs to `max_input_length` tokens instead of failing with `InputTooLong`.
    pub truncate: bool,
    /// L2-normalise pooled vectors.
    pub normalize: bool,
}

/// ONNX-based embedder that executes models through the ONNX Runtime shared library.
#[derive(Debug)]
pub struct OnnxStdIoEmbedder {
    info: EmbedderInfo,
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    pad_id: i64,
    max_input_length: usize,
    wants_token_type_ids: bool,
    normalize: bool,
}

#[derive(Debug)]
struct PreparedBatch {
    input_ids: Tensor<i64>,
    attention_mask: Tensor<i64>,
    token_type_ids: Tensor<i64>,
    attention_rows: Vec<Vec<i64>>,
}

static ORT_RUNTIME_PATH: OnceLock<PathBuf> = OnceLock::new();

impl OnnxStdIoEmbedder {
    pub fn new(config: OnnxStdIoConfig) -> Result<Self, EmbedderError> {
        if config.dimension == 0 {
            return Err(EmbedderError::InvalidConfiguration {
                message: "dimension must be greater than zero".into(),
            });
        }

        if config.max_input_length == 0 {
            return Err(EmbedderError::InvalidConfiguration {
                message: "max_input_length must be greater than zero".into(),
            });
        }

        let runtime_library_path =
            resolve_existing_path(&config.runtime_library_path, "ONNX Runtime shared library")?;
        let model_path = resolve_existing_path(&config.model_path, "ONNX model")?;
        let tokenizer_path = resolve_existing_path(&config.tokenizer_path, "tokenizer config")?;

        ensure_ort_initialized(&runtime_library_path)?;

        let session = Session::builder()
            .map_err(|err| map_ort_error("create session builder", err))?
            .commit_from_file(&model_path)
            .map_err(|err| map_ort_error("load ONNX model", err))?;

        let wants_token_type_ids = session.inputs.iter().any(|input| input.name == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|err| map_tokenizer_error("load tokenizer", err))?;
        if config.truncate {
            tokenizer
                .with_truncation(Some(TruncationParams {
                    max_length: config.max_input_length,
                    ..Default::default()
                }))
                .map_err(|err| map_tokenizer_error("configure truncation", err))?;
        }

        let pad_id = tokenizer
            .token_to_id(&config.pad_token)
            .ok_or_else(|| EmbedderError::InvalidConfiguration {
                message: format!(
                    "tokenizer `{}` does not declare a `{}` token",
                    tokenizer_path.display(),
                    config.pad_token
                ),
            })? as i64;

        tracing::info!(
            model = %model_path.display(),
            dimension = config.dimension,
            token_type_ids = wants_token_type_ids,
            "onnx embedder ready"
        );

        let info = EmbedderInfo {
            provider: ProviderKind::OnnxStdIo,
            embedding_model_id: config.embedding_model_id,
            dimension: config.dimension,
        };

        Ok(Self {
            info,
            session: Mutex::new(session),
            tokenizer,
            pad_id,
            max_input_length: config.max_input_length,
            wants_token_type_ids,
            normalize: config.normalize,
        })
    }

    fn prepare_encodings(&self, texts: &[&str]) -> Result<Vec<Encoding>, EmbedderError> {
        let encodings = texts
            .iter()
            .map(|t| self.tokenizer.encode(*t, true))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| map_tokenizer_error("tokenize inputs", err))?;

        let max_len = encodings.iter().map(Encoding::len).max().unwrap_or(0);
        if max_len > self.max_input_length {
            return Err(EmbedderError::InputTooLong {
                max_length: self.max_input_length,
                actual_length: max_len,
            });
        }

        Ok(encodings)
    }

    fn build_input_tensors(&self, encodings: &[Encoding]) -> Result<PreparedBatch, EmbedderError> {
        let batch = encodings.len();
        let seq_len = encodings.iter().map(Encoding::len).max().unwrap_or(0);

        let mut input_ids = Array2::<i64>::from_elem((batch, seq_len), self.pad_id);
        let mut attention_mask = Array2::<i64>::zeros((batch, seq_len));
        let mut token_type_ids = Array2::<i64>::zeros((batch, seq_len));

        for (row, encoding) in encodings.iter().enumerate() {
            let cells = encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .zip(encoding.get_type_ids());
            for (col, ((&id, &m), &tt)) in cells.enumerate() {
                input_ids[(row, col)] = id as i64;
                attention_mask[(row, col)] = m as i64;
                token_type_ids[(row, col)] = tt as i64;
            }
        }

        let attention_rows = attention_mask.rows().into_iter().map(|r| r.to_vec()).collect();

        let input_ids = Tensor::from_array(input_ids).map_err(|err| map_ort_error("prepare input_ids", err))?;
        let attention_mask = Tensor::from_array(attention_mask)
            .map_err(|err| map_ort_error("prepare attention_mask", err))?;
        let token_type_ids = Tensor::from_array(token_type_ids)
            .map_err(|err| map_ort_error("prepare token_type_ids", err))?;

        Ok(PreparedBatch {
            input_ids,
            attention_mask,
            token_type_ids,
            attention_rows,
        })
    }

    /// Returns the flattened last hidden state and its `(batch, seq_len, hidden)` shape.
    fn run_session(&self, prepared: PreparedBatch) -> Result<(Vec<f32>, usize, usize, usize), EmbedderError> {
        let mut session = self.session.lock().map_err(|_| EmbedderError::ProviderFailure {
            message: "ONNX session lock poisoned".into(),
        })?;
        let outputs = if self.wants_token_type_ids {
            session.run(ort::inputs![prepared.input_ids, prepared.attention_mask, prepared.token_type_ids])
        } else {
            session.run(ort::inputs![prepared.input_ids, prepared.attention_mask])
        }
        .map_err(|err| map_ort_error("execute ONNX session", err))?;

        // The first output is the token-level hidden state.
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|err| map_ort_error("extract output tensor", err))?;

        if shape.len() != 3 {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return Err(EmbedderError::ProviderFailure {
                message: format!(
                    "model output must be rank-3 [batch, seq_len, hidden], got shape {:?}",
                    dims
                ),
            });
        }

        let dim = |i: usize| {
            usize::try_from(shape[i]).map_err(|_| EmbedderError::ProviderFailure {
                message: format!("negative output dimension {}", shape[i]),
            })
        };
        Ok((data.to_vec(), dim(0)?, dim(1)?, dim(2)?))
    }

    fn mean_pool(&self, data: &[f32], attention_rows: &[Vec<i64>], seq_len: usize, hidden: usize) -> Vec<Vec<f32>> {
        attention_rows
            .iter()
            .enumerate()
            .map(|(b, mask)| {
                let mut sum = vec![0f32; hidden];
                let mut count = 0f32;
                for (t, &m) in mask.iter().enumerate().take(seq_len) {
                    if m == 1 {
                        let base = (b * seq_len + t) * hidden;
                        for (acc, v) in sum.iter_mut().zip(&data[base..base + hidden]) {
                            *acc += v;
                        }
                        count += 1.0;
                    }
                }
                if count > 0.0 {
                    sum.iter_mut().for_each(|x| *x /= count);
                }
                if self.normalize {
                    l2_normalize(&mut sum);
                }
                sum
            })
            .collect()
    }
}

impl Embedder for OnnxStdIoEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbedderError::ProviderFailure { message: "missing pooled output".into() })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self.prepare_encodings(texts)?;
        let prepared = self.build_input_tensors(&encodings)?;
        let attention_rows = prepared.attention_rows.clone();
        let expected_seq_len = encodings.iter().map(Encoding::len).max().unwrap_or(0);

        let (raw_data, batch, seq_len, hidden) = self.run_session(prepared)?;

        if batch != texts.len() {
            return Err(EmbedderError::ProviderFailure {
                message: format!("model returned batch size {batch}, expected {}", texts.len()),
            });
        }

        if seq_len != expected_seq_len {
            return Err(EmbedderError::ProviderFailure {
                message: format!("model returned sequence length {seq_len}, expected {expected_seq_len}"),
            });
        }

        if hidden != self.info.dimension {
            return Err(EmbedderError::ProviderFailure {
                message: format!(
                    "pooled embedding dimension {} does not match configured dimension {}",
                    hidden, self.info.dimension
                ),
            });
        }

        Ok(self.mean_pool(&raw_data, &attention_rows, seq_len, hidden))
    }

    fn info(&self) -> &EmbedderInfo {
        &self.info
    }
}

/// Configuration for [`HashingEmbedder`].
#[derive(Debug, Clone)]
pub struct HashingConfig {
    pub dimension: usize,
    /// Maximum input length in characters.
    pub max_input_length: usize,
}

/// Model-free embedder: lower-cased word tokens are hashed into signed
/// buckets and the result is L2-normalised.
///
/// Texts sharing words land close together, which is enough for offline
/// runs and tests. Deterministic within a process.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    info: EmbedderInfo,
    max_input_length: usize,
}

impl HashingEmbedder {
    pub fn new(config: HashingConfig) -> Result<Self, EmbedderError> {
        if config.dimension == 0 {
            return Err(EmbedderError::InvalidConfiguration {
                message: "dimension must be greater than zero".into(),
            });
        }

        if config.max_input_length == 0 {
            return Err(EmbedderError::InvalidConfiguration {
                message: "max_input_length must be greater than zero".into(),
            });
        }

        Ok(Self {
            info: EmbedderInfo {
                provider: ProviderKind::Hashing,
                embedding_model_id: format!("token-hash-{}", config.dimension),
                dimension: config.dimension,
            },
            max_input_length: config.max_input_length,
        })
    }

    fn validate_length(&self, text: &str) -> Result<(), EmbedderError> {
        let actual_length = text.chars().count();
        if actual_length > self.max_input_length {
            return Err(EmbedderError::InputTooLong {
                max_length: self.max_input_length,
                actual_length,
            });
        }
        Ok(())
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut output = vec![0f32; self.info.dimension];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        for token in tokens {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let hash = hasher.finish();
            let bucket = (hash % self.info.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            output[bucket] += sign;
        }
        l2_normalize(&mut output);
        output
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        self.validate_length(text)?;
        Ok(self.generate_embedding(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn info(&self) -> &EmbedderInfo {
        &self.info
    }
}

fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

fn ensure_ort_initialized(runtime_library_path: &Path) -> Result<(), EmbedderError> {
    if let Some(existing) = ORT_RUNTIME_PATH.get() {
        if !paths_equal(existing, runtime_library_path) {
            return Err(EmbedderError::InvalidConfiguration {
                message: format!(
                    "ONNX Runtime already initialized with library `{}`; cannot reinitialize with `{}`",
                    existing.display(),
                    runtime_library_path.display()
                ),
            });
        }
        return Ok(());
    }

    ort::init_from(runtime_library_path.to_string_lossy().to_string())
        .with_name("doc-qa")
        .commit()
        .map_err(|err| map_ort_error("initialize ONNX Runtime environment", err))?;
    let _ = ORT_RUNTIME_PATH.set(runtime_library_path.to_path_buf());

    Ok(())
}

fn resolve_existing_path(path: &Path, description: &str) -> Result<PathBuf, EmbedderError> {
    fs::metadata(path).map_err(|_| EmbedderError::InvalidConfiguration {
        message: format!("{description} `{}` does not exist", path.display()),
    })?;

    path.canonicalize()
        .map_err(|err| EmbedderError::ProviderFailure {
            message: format!(
                "failed to canonicalize {description} `{}`: {err}",
                path.display()
            ),
        })
}

fn map_ort_error(context: &str, err: OrtError) -> EmbedderError {
    EmbedderError::ProviderFailure {
        message: format!("{context} failed: {err}"),
    }
}

fn map_tokenizer_error(context: &str, err: tokenizers::Error) -> EmbedderError {
    EmbedderError::ProviderFailure {
        message: format!("{context} failed: {err}"),
    }
}

fn paths_equal(a: &Path, b: &Path) -> bool {
    if let (Ok(a), Ok(b)) = (fs::canonicalize(a), fs::canonicalize(b)) {
        a == b
    } else {
        a == b
    }
}
