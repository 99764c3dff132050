//! Fixed-size, overlapping character windows.

use thiserror::Error;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_OVERLAP: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("invalid chunk configuration: overlap {overlap} must be smaller than chunk_size {chunk_size}")]
    InvalidConfiguration { chunk_size: usize, overlap: usize },
}

/// Window parameters, both measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, overlap: DEFAULT_OVERLAP }
    }
}

impl ChunkParams {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkError> {
        let params = Self { chunk_size, overlap };
        params.validate()?;
        Ok(params)
    }

    /// Requires `overlap < chunk_size`; anything else would never advance.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.overlap >= self.chunk_size {
            return Err(ChunkError::InvalidConfiguration {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }

    /// Distance between the starts of two consecutive windows.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Split `text` into windows of `params.chunk_size` characters, each starting
/// `stride()` characters after the previous one.
///
/// Stops as soon as a window reaches the end of the text, so a text that fits
/// in one window always yields exactly one chunk. A plain `while start < len`
/// loop would also emit trailing windows made only of overlap text:
/// `"abcdefghij"` with size 4 and overlap 1 gives 3 chunks here, not 4.
pub fn chunk_text(text: &str, params: &ChunkParams) -> Result<Vec<String>, ChunkError> {
    params.validate()?;

    // Byte offset of every char boundary, plus the end of the string.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = bounds.len() - 1;

    let mut out = Vec::with_capacity(len / params.stride() + 1);
    let mut start = 0usize;
    while start < len {
        let end = (start + params.chunk_size).min(len);
        out.push(text[bounds[start]..bounds[end]].to_string());
        if end == len {
            break;
        }
        start += params.stride();
    }
    Ok(out)
}

/// Convenience form of [`chunk_text`] taking the two parameters directly.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    chunk_text(text, &ChunkParams { chunk_size, overlap })
}

/// Join extracted segments into the single string a document is chunked from.
///
/// Page and paragraph boundaries are flattened to one space.
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    segments.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ")
}
