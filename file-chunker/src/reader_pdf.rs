use std::path::Path;

use crate::ExtractError;

/// Extract one segment per page that carries text.
#[cfg(feature = "pure-pdf")]
pub fn read_pdf_segments(path: &Path) -> Result<Vec<String>, ExtractError> {
    let doc = lopdf::Document::load(path).map_err(|e| ExtractError::read(path, e))?;
    let mut out = Vec::new();
    for page_num in doc.get_pages().into_keys() {
        match doc.extract_text(&[page_num]) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    out.push(text.to_string());
                }
            }
            Err(err) => tracing::debug!(path = %path.display(), page = page_num, %err, "no text on pdf page"),
        }
    }
    Ok(out)
}

#[cfg(not(feature = "pure-pdf"))]
pub fn read_pdf_segments(path: &Path) -> Result<Vec<String>, ExtractError> {
    tracing::warn!(path = %path.display(), "pure-pdf backend not enabled");
    Err(ExtractError::UnsupportedFormat("pdf (pure-pdf feature disabled)".into()))
}
